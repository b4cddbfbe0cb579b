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

//! # IMS-Limits
//! The Limit Service (§4.7): holds the consumable short-sell-available and locate-available
//! counters used by the synchronous workflows, behind a compare-and-swap contract with bounded
//! retries. Idempotency keys are remembered for a configurable window so a replayed
//! `tryDecrement` returns the original result instead of decrementing twice; TTL-bearing
//! decrements (locate holds) expire asynchronously and replenish the counter.

pub mod counter;
pub mod error;
pub mod idempotency;
pub mod key;
pub mod service;
pub mod store;

pub use counter::LimitCounter;
pub use error::LimitError;
pub use key::LimitKey;
pub use service::{DecrementOutcome, LimitService};
pub use store::{InMemoryLimitCounterStore, LimitCounterStore};
