/// Configuration module for the IMS system.
///
/// Provides a [`SystemConfig`], deserialised from TOML on startup and optionally layered with
/// environment overrides, covering per-feed source priorities, per-market Rule Engine settings,
/// Limit Service retry/backoff knobs, and the Short-Sell Gate deadline budget.
use ims_data::source::SourceTag;
use ims_instrument::counterparty::CounterpartyKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level configuration for a full IMS deployment.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SystemConfig {
    /// Partitions allocated per bus topic (§4.1, §5).
    #[serde(default = "default_bus_partitions")]
    pub bus_partitions: u32,

    /// Source priority overrides. A source absent from this table falls back to
    /// [`SourceTag::default_priority`].
    #[serde(default)]
    pub source_priorities: HashMap<SourceTag, u8>,

    /// Per-`(market, calculation_type)` Rule Engine settings.
    #[serde(default)]
    pub markets: Vec<MarketConfig>,

    /// Limit Service retry/backoff and idempotency-window configuration.
    pub limits: LimitServiceConfig,

    /// Locate Workflow auto-approval policy, keyed by `(market, client kind)`.
    #[serde(default)]
    pub locate_policy: Vec<LocatePolicyConfig>,

    /// Short-Sell Gate deadline budget.
    pub short_sell_gate: ShortSellGateConfig,

    /// Position/Inventory snapshot cadence, events-per-partition between checkpoints (§4.4).
    #[serde(default = "default_snapshot_every_n")]
    pub snapshot_every_n: u32,

    /// Publisher per-topic buffer depth (§4.10).
    #[serde(default = "default_publisher_buffer")]
    pub publisher_buffer: usize,
}

fn default_bus_partitions() -> u32 {
    16
}

fn default_snapshot_every_n() -> u32 {
    1_000
}

fn default_publisher_buffer() -> usize {
    1_024
}

/// Rule Engine selection scope for one `(market, calculation_type)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MarketConfig {
    pub market: String,
    pub calculation_type: String,
}

/// Compare-and-swap retry and idempotency-window configuration for the Limit Service (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct LimitServiceConfig {
    pub max_retries: u32,
    pub idempotency_window_secs: u64,
}

/// One auto-approval policy entry for the Locate Workflow (§4.8).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LocatePolicyConfig {
    pub market: String,
    pub client_kind: CounterpartyKind,
    pub auto_approval_cap: Option<String>,
    #[serde(default)]
    pub allow_partial_approval: bool,
    pub hold_duration_secs: u64,
}

/// Synchronous decrement deadline budget for the Short-Sell Gate (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ShortSellGateConfig {
    pub decrement_budget_ms: u64,
}

impl SystemConfig {
    /// Parses a [`SystemConfig`] from TOML text, as loaded from the deployment's config file.
    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn source_priority(&self, source: SourceTag) -> u8 {
        self.source_priorities
            .get(&source)
            .copied()
            .unwrap_or_else(|| source.default_priority())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        bus_partitions = 8
        snapshot_every_n = 500
        publisher_buffer = 256

        [source_priorities]
        reuters = 110

        [[markets]]
        market = "XLON"
        calculation_type = "short_sell"

        [[locate_policy]]
        market = "XLON"
        client_kind = "broker"
        auto_approval_cap = "50000"
        allow_partial_approval = true
        hold_duration_secs = 3600

        [limits]
        max_retries = 3
        idempotency_window_secs = 86400

        [short_sell_gate]
        decrement_budget_ms = 50
    "#;

    #[test]
    fn parses_a_complete_config_from_toml() {
        let config = SystemConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.bus_partitions, 8);
        assert_eq!(config.limits.max_retries, 3);
        assert_eq!(config.short_sell_gate.decrement_budget_ms, 50);
        assert_eq!(config.markets.len(), 1);
        assert_eq!(config.locate_policy.len(), 1);
    }

    #[test]
    fn an_unconfigured_source_falls_back_to_its_default_priority() {
        let config = SystemConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.source_priority(SourceTag::Reuters), 110);
        assert_eq!(
            config.source_priority(SourceTag::Bloomberg),
            SourceTag::Bloomberg.default_priority()
        );
    }
}
