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

//! # IMS-Publisher
//! The Publisher (§4.10): fans out `InventoryAvailability` deltas, position deltas, and decision
//! records to downstream consumers with a per-subscriber cursor, at-least-once delivery, and
//! backpressure — a subscriber that falls behind a bounded buffer is told it's lagging rather
//! than silently missing updates.

pub mod aggregate;
pub mod channel;
pub mod error;
pub mod model;

pub use aggregate::ImsPublisher;
pub use channel::{Publisher, Subscription};
pub use error::PublisherError;
pub use model::DecisionRecord;
