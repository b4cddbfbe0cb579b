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

//! # IMS-Workflow
//! The Locate Workflow (§4.8) and Short-Sell Gate (§4.9): the two query-path components that sit
//! in front of the Limit Service. The Locate Workflow is a slower, policy-driven auto-approve
//! path that falls back to a manual queue; the Short-Sell Gate is the latency-critical
//! synchronous decrement decision bound to a millisecond budget.

pub mod decision_log;
pub mod error;
pub mod locate;
pub mod model;
pub mod policy;
pub mod short_sell;

pub use decision_log::DecisionLog;
pub use error::WorkflowError;
pub use locate::LocateWorkflow;
pub use policy::{LocatePolicy, TablePolicy};
pub use short_sell::ShortSellGate;
