use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// A component's self-reported health (§ ambient stack: `HealthCheck` aggregator trait polled by
/// the root binary's `/healthz`-equivalent CLI command).
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub enum HealthStatus {
    Healthy,
    Degraded { reason: String },
    Unhealthy { reason: String },
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

/// Implemented by any component the root binary polls for liveness (Position Engine shard,
/// Rule Engine, Limit Service, Publisher, ...).
pub trait HealthCheck: Send + Sync {
    fn component_name(&self) -> &str;

    fn check(&self) -> HealthStatus;
}

/// A report for a single registered component, as returned by [`HealthRegistry::report`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ComponentHealth {
    pub component: String,
    pub status: HealthStatus,
}

/// Aggregates [`HealthCheck`] implementations registered by each component, polled as a whole by
/// the root binary's operator surface.
#[derive(Default)]
pub struct HealthRegistry {
    checks: Mutex<Vec<Box<dyn HealthCheck>>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, check: Box<dyn HealthCheck>) {
        self.checks.lock().push(check);
    }

    /// Polls every registered component. The aggregate is unhealthy if any component is, degraded
    /// if any is degraded and none is unhealthy, healthy otherwise.
    pub fn report(&self) -> (HealthStatus, Vec<ComponentHealth>) {
        let components: Vec<ComponentHealth> = self
            .checks
            .lock()
            .iter()
            .map(|check| ComponentHealth {
                component: check.component_name().to_owned(),
                status: check.check(),
            })
            .collect();

        let aggregate = if components.iter().any(|c| matches!(c.status, HealthStatus::Unhealthy { .. })) {
            HealthStatus::Unhealthy {
                reason: "one or more components are unhealthy".into(),
            }
        } else if components.iter().any(|c| matches!(c.status, HealthStatus::Degraded { .. })) {
            HealthStatus::Degraded {
                reason: "one or more components are degraded".into(),
            }
        } else {
            HealthStatus::Healthy
        };

        (aggregate, components)
    }
}

impl std::fmt::Debug for HealthRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthRegistry")
            .field("registered", &self.checks.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Always(HealthStatus, &'static str);

    impl HealthCheck for Always {
        fn component_name(&self) -> &str {
            self.1
        }

        fn check(&self) -> HealthStatus {
            self.0.clone()
        }
    }

    #[test]
    fn healthy_when_every_component_is_healthy() {
        let registry = HealthRegistry::new();
        registry.register(Box::new(Always(HealthStatus::Healthy, "rules")));
        registry.register(Box::new(Always(HealthStatus::Healthy, "limits")));

        let (aggregate, components) = registry.report();
        assert_eq!(aggregate, HealthStatus::Healthy);
        assert_eq!(components.len(), 2);
    }

    #[test]
    fn unhealthy_outranks_degraded_in_the_aggregate() {
        let registry = HealthRegistry::new();
        registry.register(Box::new(Always(
            HealthStatus::Degraded { reason: "slow".into() },
            "rules",
        )));
        registry.register(Box::new(Always(
            HealthStatus::Unhealthy { reason: "down".into() },
            "limits",
        )));

        let (aggregate, _) = registry.report();
        assert!(matches!(aggregate, HealthStatus::Unhealthy { .. }));
    }
}
