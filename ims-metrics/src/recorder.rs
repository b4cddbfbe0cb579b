use std::sync::Arc;

extern crate metrics as metrics_rs;
use metrics_rs::{Counter, CounterFn, Gauge, GaugeFn, Histogram, HistogramFn, Key, KeyName, Metadata, Recorder, SharedString, Unit};

#[derive(Clone, Debug)]
struct TracingHandle(Key);

impl CounterFn for TracingHandle {
    fn increment(&self, value: u64) {
        tracing::trace!(metric = %self.0, kind = "counter.increment", value);
    }

    fn absolute(&self, value: u64) {
        tracing::trace!(metric = %self.0, kind = "counter.absolute", value);
    }
}

impl GaugeFn for TracingHandle {
    fn increment(&self, value: f64) {
        tracing::trace!(metric = %self.0, kind = "gauge.increment", value);
    }

    fn decrement(&self, value: f64) {
        tracing::trace!(metric = %self.0, kind = "gauge.decrement", value);
    }

    fn set(&self, value: f64) {
        tracing::trace!(metric = %self.0, kind = "gauge.set", value);
    }
}

impl HistogramFn for TracingHandle {
    fn record(&self, value: f64) {
        tracing::trace!(metric = %self.0, kind = "histogram.record", value);
    }
}

/// A [`Recorder`] that emits every metric event as a `tracing` event rather than to a real
/// metrics backend (StatsD, Prometheus, ...). Good enough for local runs and tests; production
/// deployments install a real exporter via `metrics::set_global_recorder` before this one.
#[derive(Debug)]
pub struct TracingRecorder;

impl Recorder for TracingRecorder {
    fn describe_counter(&self, key_name: KeyName, unit: Option<Unit>, description: SharedString) {
        tracing::debug!(metric = key_name.as_str(), ?unit, %description, "registered counter");
    }

    fn describe_gauge(&self, key_name: KeyName, unit: Option<Unit>, description: SharedString) {
        tracing::debug!(metric = key_name.as_str(), ?unit, %description, "registered gauge");
    }

    fn describe_histogram(&self, key_name: KeyName, unit: Option<Unit>, description: SharedString) {
        tracing::debug!(metric = key_name.as_str(), ?unit, %description, "registered histogram");
    }

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::from_arc(Arc::new(TracingHandle(key.clone())))
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::from_arc(Arc::new(TracingHandle(key.clone())))
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::from_arc(Arc::new(TracingHandle(key.clone())))
    }
}
