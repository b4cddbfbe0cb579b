/// Wires a complete IMS system from a [`SystemConfig`](crate::system::config::SystemConfig):
/// Reference Store, per-source Feed Normalizers, Rule Engine, Inventory Calculator, Position
/// Engine, Limit Service, Locate Workflow, Short-Sell Gate, Publisher, and the cross-component
/// [`HealthRegistry`].
use crate::{
    error::ImsError,
    system::{System, config::SystemConfig},
};
use ims_data::{
    normalizer::SourceNormalizer,
    source::SourceTag,
    sources::{reference_data::ReferenceDataNormalizer, trade_contract::TradeContractNormalizer},
};
use ims_instrument::{security::IdentifierKind, store::ReferenceStore};
use ims_integration::bus::InMemoryBus;
use ims_inventory::InventoryCalculator;
use ims_limits::{LimitService, store::InMemoryLimitCounterStore};
use ims_metrics::HealthRegistry;
use ims_position::{engine::PositionEngine, snapshot::InMemorySnapshotStore};
use ims_publisher::ImsPublisher;
use ims_rules::RuleEngine;
use ims_workflow::{locate::LocateWorkflow, policy::TablePolicy, short_sell::ShortSellGate};
use rust_decimal::Decimal;
use std::{collections::HashMap, str::FromStr, sync::Arc, time::Duration};

const REFERENCE_DATA_SOURCES: &[(SourceTag, IdentifierKind)] = &[
    (SourceTag::Reuters, IdentifierKind::Ric),
    (SourceTag::Bloomberg, IdentifierKind::Bloomberg),
    (SourceTag::MarkIt, IdentifierKind::Cusip),
    (SourceTag::Ultumus, IdentifierKind::Isin),
    (SourceTag::Rimes, IdentifierKind::Sedol),
];

/// Builds a [`System`] ready to serve the operator CLI surface, from a parsed [`SystemConfig`].
#[derive(Debug, Default)]
pub struct SystemBuilder;

impl SystemBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(self, config: &SystemConfig) -> Result<System, ImsError> {
        let bus = Arc::new(InMemoryBus::new(config.bus_partitions));
        let reference = Arc::new(ReferenceStore::new());

        let mut sources: HashMap<SourceTag, Arc<dyn SourceNormalizer>> = HashMap::new();
        for &(tag, identifier_kind) in REFERENCE_DATA_SOURCES {
            sources.insert(
                tag,
                Arc::new(ReferenceDataNormalizer::new(
                    tag,
                    identifier_kind,
                    config.source_priority(tag),
                    reference.clone(),
                )) as Arc<dyn SourceNormalizer>,
            );
        }
        sources.insert(
            SourceTag::TradeContract,
            Arc::new(TradeContractNormalizer::new(reference.clone())) as Arc<dyn SourceNormalizer>,
        );

        let rules = Arc::new(RuleEngine::new());
        let inventory = Arc::new(InventoryCalculator::new(rules.clone()));
        let position = Arc::new(PositionEngine::new(
            0,
            Arc::new(InMemorySnapshotStore::new()),
            config.snapshot_every_n,
        ));

        let limit_store = Arc::new(InMemoryLimitCounterStore::new());
        let limits = Arc::new(LimitService::new(
            limit_store,
            Duration::from_secs(config.limits.idempotency_window_secs),
            config.limits.max_retries,
        ));

        let mut policy = TablePolicy::new();
        let mut hold_duration = Duration::from_secs(3600);
        for entry in &config.locate_policy {
            if let Some(cap) = &entry.auto_approval_cap {
                let cap = Decimal::from_str(cap).map_err(|_| ImsError::UnknownMarketConfig {
                    market: entry.market.clone(),
                    calculation_type: "locate".into(),
                })?;
                policy = policy.with_cap(entry.market.clone(), entry.client_kind, cap);
            }
            policy = policy.with_partial_approval(
                entry.market.clone(),
                entry.client_kind,
                entry.allow_partial_approval,
            );
            hold_duration = Duration::from_secs(entry.hold_duration_secs);
        }

        let locate = Arc::new(LocateWorkflow::new(
            reference.clone(),
            limits.clone(),
            Arc::new(policy),
            hold_duration,
        ));
        let short_sell = Arc::new(ShortSellGate::new(
            limits.clone(),
            Duration::from_millis(config.short_sell_gate.decrement_budget_ms),
        ));

        let publisher = Arc::new(ImsPublisher::new(config.publisher_buffer));

        let health = Arc::new(HealthRegistry::new());
        health.register(Box::new(PositionEngineHandle(position.clone())));
        health.register(Box::new(RuleEngineHandle(rules.clone())));
        health.register(Box::new(InventoryHandle(inventory.clone())));
        health.register(Box::new(LimitServiceHandle(limits.clone())));
        health.register(Box::new(LocateHandle(locate.clone())));
        health.register(Box::new(ShortSellHandle(short_sell.clone())));
        health.register(Box::new(PublisherHandle(publisher.clone())));

        Ok(System {
            bus,
            reference,
            sources,
            rules,
            inventory,
            position,
            limits,
            locate,
            short_sell,
            publisher,
            health,
        })
    }
}

/// `ims_metrics::HealthCheck` can't be implemented directly for `Arc<T>` across crate
/// boundaries without an orphan-rule conflict, so the builder registers one thin forwarding
/// handle per component instead.
macro_rules! health_handle {
    ($name:ident, $inner:ty) => {
        struct $name(Arc<$inner>);

        impl ims_metrics::HealthCheck for $name {
            fn component_name(&self) -> &str {
                ims_metrics::HealthCheck::component_name(self.0.as_ref())
            }

            fn check(&self) -> ims_metrics::HealthStatus {
                ims_metrics::HealthCheck::check(self.0.as_ref())
            }
        }
    };
}

health_handle!(PositionEngineHandle, PositionEngine);
health_handle!(RuleEngineHandle, RuleEngine);
health_handle!(InventoryHandle, InventoryCalculator);
health_handle!(LimitServiceHandle, LimitService);
health_handle!(LocateHandle, LocateWorkflow);
health_handle!(ShortSellHandle, ShortSellGate);
health_handle!(PublisherHandle, ImsPublisher);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::config::LocatePolicyConfig;
    use ims_metrics::HealthStatus;

    fn sample_config() -> SystemConfig {
        SystemConfig::from_toml(
            r#"
                bus_partitions = 4

                [limits]
                max_retries = 3
                idempotency_window_secs = 3600

                [short_sell_gate]
                decrement_budget_ms = 50
            "#,
        )
        .unwrap()
    }

    #[test]
    fn builds_a_system_with_every_source_normalizer_wired() {
        let system = SystemBuilder::new().build(&sample_config()).unwrap();

        for source in [
            SourceTag::Reuters,
            SourceTag::Bloomberg,
            SourceTag::MarkIt,
            SourceTag::Ultumus,
            SourceTag::Rimes,
            SourceTag::TradeContract,
        ] {
            assert!(system.sources.contains_key(&source));
        }
    }

    #[test]
    fn a_freshly_built_system_reports_healthy() {
        let system = SystemBuilder::new().build(&sample_config()).unwrap();
        let (aggregate, components) = system.health();

        assert_eq!(aggregate, HealthStatus::Healthy);
        assert_eq!(components.len(), 7);
    }

    #[test]
    fn an_unparseable_locate_cap_is_rejected() {
        let mut config = sample_config();
        config.locate_policy.push(LocatePolicyConfig {
            market: "XLON".into(),
            client_kind: ims_instrument::counterparty::CounterpartyKind::Broker,
            auto_approval_cap: Some("not-a-decimal".into()),
            allow_partial_approval: false,
            hold_duration_secs: 3600,
        });

        let result = SystemBuilder::new().build(&config);
        assert!(matches!(result, Err(ImsError::UnknownMarketConfig { .. })));
    }
}
