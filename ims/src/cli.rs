/// The operator CLI surface (§6): `reprocess-batch`, `reload-rules`, `snapshot-now`,
/// `replay-from`, and a `health` command polling every component's [`ims_metrics::HealthCheck`].
use clap::{Parser, Subcommand};
use ims_data::source::SourceTag;

#[derive(Debug, Parser)]
#[command(name = "ims", about = "Inventory Management System operator CLI")]
pub struct Cli {
    /// Path to the system's TOML configuration file.
    #[arg(long, default_value = "ims.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Re-runs a previously failed batch of raw feed lines through its source normalizer.
    ReprocessBatch {
        /// Source the batch originated from.
        #[arg(long, value_parser = parse_source)]
        source: SourceTag,

        /// Batch identifier, as recorded when the batch originally failed.
        batch_id: String,

        /// Path to a file containing one raw feed line per line.
        file: String,
    },

    /// Invalidates every cached Rule Engine selection so the next recompute re-selects rules.
    ReloadRules,

    /// Forces an immediate Position Engine checkpoint at the given bus offset.
    SnapshotNow {
        /// Bus offset to checkpoint against.
        offset: u64,
    },

    /// Replays every Position Engine event on the bus at or after the given offset.
    ReplayFrom {
        /// Offset to resume replay from.
        offset: u64,
    },

    /// Polls every component's health check and prints the aggregate report.
    Health,
}

fn parse_source(raw: &str) -> Result<SourceTag, String> {
    match raw {
        "reuters" => Ok(SourceTag::Reuters),
        "bloomberg" => Ok(SourceTag::Bloomberg),
        "markit" => Ok(SourceTag::MarkIt),
        "ultumus" => Ok(SourceTag::Ultumus),
        "rimes" => Ok(SourceTag::Rimes),
        "trade-contract" => Ok(SourceTag::TradeContract),
        other => Err(format!(
            "unknown source '{other}' (expected one of: reuters, bloomberg, markit, ultumus, rimes, trade-contract)"
        )),
    }
}
