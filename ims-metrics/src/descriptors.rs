use std::fmt::Write;

/// A named, described metric (§ ambient stack: counters/gauges/histograms per component).
pub struct MetricMetadata {
    name: &'static str,
    description: &'static str,
}

impl MetricMetadata {
    pub fn name(&self) -> String {
        self.name_with_prefix("ims.")
    }

    pub fn name_with_prefix(&self, prefix: &str) -> String {
        let mut full = String::with_capacity(prefix.len() + self.name.len());
        // This operation must succeed on a String; ignore the Result.
        let _ = full.write_str(prefix);
        let _ = full.write_str(self.name);
        full
    }

    pub fn description(&self) -> &'static str {
        self.description
    }
}

pub static EVENTS_PROCESSED_TOTAL: MetricMetadata = MetricMetadata {
    name: "events_processed_total",
    description: "Number of events successfully applied by this component",
};

pub static EVENTS_FAILED_TOTAL: MetricMetadata = MetricMetadata {
    name: "events_failed_total",
    description: "Number of events rejected or errored by this component",
};

pub static CONSUMER_LAG: MetricMetadata = MetricMetadata {
    name: "consumer_lag",
    description: "Event Bus offset lag between the latest published offset and this component's consumed offset",
};

pub static DECISION_LATENCY_MS: MetricMetadata = MetricMetadata {
    name: "decision_latency_ms",
    description: "Latency of a Short-Sell Gate or Locate Workflow decision, in milliseconds",
};

pub static RULE_ENGINE_PUBLISH_COUNT: MetricMetadata = MetricMetadata {
    name: "rule_engine.publish",
    description: "Number of rule versions published",
};

pub static LIMIT_SERVICE_CONTENDED_TOTAL: MetricMetadata = MetricMetadata {
    name: "limit_service.contended_total",
    description: "Number of tryDecrement calls that exhausted their CAS retry budget",
};

pub static PUBLISHER_SUBSCRIBER_LAGGING_TOTAL: MetricMetadata = MetricMetadata {
    name: "publisher.subscriber_lagging_total",
    description: "Number of subscribers disconnected for falling behind their buffer",
};

/// Label key identifying which component emitted a metric (§ ambient stack: structured fields
/// carry `(component, key, event_id)` per failure).
pub static LABEL_COMPONENT: &str = "component";
pub static LABEL_MARKET: &str = "market";
