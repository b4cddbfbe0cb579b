use clap::Parser;
use ims::{
    cli::{Cli, Command},
    logging,
    system::{builder::SystemBuilder, config::SystemConfig},
};
use ims_data::batch::BatchId;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init_logging();

    let cli = Cli::parse();

    let raw_config = match std::fs::read_to_string(&cli.config) {
        Ok(raw) => raw,
        Err(error) => {
            tracing::error!(config = %cli.config, %error, "failed to read config file");
            return ExitCode::FAILURE;
        }
    };

    let config = match SystemConfig::from_toml(&raw_config) {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(%error, "failed to parse config file");
            return ExitCode::FAILURE;
        }
    };

    let system = match SystemBuilder::new().build(&config) {
        Ok(system) => system,
        Err(error) => {
            tracing::error!(%error, "failed to build system");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::ReprocessBatch {
            source,
            batch_id,
            file,
        } => match std::fs::read_to_string(&file) {
            Ok(raw) => {
                let lines: Vec<String> = raw.lines().map(str::to_owned).collect();
                system
                    .reprocess_batch(source, BatchId::new(batch_id), lines)
                    .await
                    .map(|report| serde_json::to_string_pretty(&report).unwrap_or_default())
                    .map_err(|error| error.to_string())
            }
            Err(error) => Err(error.to_string()),
        },
        Command::ReloadRules => {
            system.reload_rules();
            Ok("rule caches invalidated".to_owned())
        }
        Command::SnapshotNow { offset } => {
            system.snapshot_now(offset).await;
            Ok(format!("checkpointed at offset {offset}"))
        }
        Command::ReplayFrom { offset } => system
            .replay_from(offset)
            .await
            .map(|replayed| format!("replayed {replayed} event(s) from offset {offset}"))
            .map_err(|error| error.to_string()),
        Command::Health => {
            let (aggregate, components) = system.health();
            Ok(serde_json::json!({
                "aggregate": aggregate,
                "components": components,
            })
            .to_string())
        }
    };

    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!(%error, "command failed");
            ExitCode::FAILURE
        }
    }
}
