#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms,
    rust_2024_compatibility
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments, type_alias_bounds)]

//! # IMS-Metrics
//! Health and metrics facade shared across every component (ambient: counters/gauges/histograms
//! via the `metrics` crate facade, plus a `HealthCheck` aggregator trait each component
//! implements and the root binary polls).

pub mod descriptors;
pub mod health;
pub mod recorder;

pub use health::{ComponentHealth, HealthCheck, HealthRegistry, HealthStatus};
pub use recorder::TracingRecorder;
