#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments, type_alias_bounds)]

//! # IMS-Integration
//! Low-level framework underpinning the IMS Event Bus Adapter (§4.1): ordered, at-least-once
//! delivery to/from a durable log, partitioned by key, with explicit offset checkpointing.
//!
//! Utilised by every other IMS crate that needs to publish or consume canonical events. It is:
//! * **Low-Level**: translates raw batch/stream input into canonical events via arbitrary
//!   transformations, independent of the transport that carries them.
//! * **Flexible**: the same [`Transformer`] abstraction normalises batch files and real-time feed
//!   messages alike.
//!
//! ## Core abstractions
//! - [`bus::Bus`] providing `publish`/`poll`/`commit`/`dead_letter` over a partitioned topic.
//! - [`stream::ExchangeStream`] providing configurable communication over any asynchronous
//!   stream protocol, driven by a [`Transformer`].

use crate::error::BusError;
use serde::{Deserialize, Serialize};

/// All [`Error`](std::error::Error)s generated in `ims-integration`.
pub mod error;

/// The Event Bus Adapter contract (§4.1): `publish`, `poll`, `commit`, `dead_letter`.
pub mod bus;

/// Contains `StreamParser` abstractions for transforming protocol-specific messages into a
/// generic output data structure.
pub mod protocol;

/// Utilities to assist deserialisation of feed payloads.
pub mod de;

/// Defines a [`Topic`](subscription::Topic) and [`ConsumerGroup`](subscription::ConsumerGroup)
/// identifying a Bus topic and the consumer checkpointing against it.
pub mod subscription;

/// Defines a trait [`Tx`](channel::Tx) abstraction over different channel kinds, as well as
/// other channel utilities.
///
/// eg/ `UnboundedTx`, `ChannelTxDroppable`, etc.
pub mod channel;

pub mod collection;

/// Stream utilities.
pub mod stream;

pub mod snapshot;

/// [`Validator`]s are capable of determining if their internal state is satisfactory to fulfill
/// some use case defined by the implementor.
pub trait Validator {
    /// Check if `Self` is valid for some use case.
    fn validate(self) -> Result<Self, BusError>
    where
        Self: Sized;
}

/// [`Transformer`]s are capable of transforming any `Input` into an iterator of
/// `Result<Self::Output, Self::Error>`s.
pub trait Transformer {
    type Error;
    type Input;
    type Output;
    type OutputIter: IntoIterator<Item = Result<Self::Output, Self::Error>>;

    fn transform(&mut self, input: Self::Input) -> Self::OutputIter;
}

/// Determines if something is considered "unrecoverable", such as an unrecoverable error.
///
/// Note that the meaning of [`Unrecoverable`] may vary depending on the context.
pub trait Unrecoverable {
    fn is_unrecoverable(&self) -> bool;
}

/// Trait that communicates if something is terminal (eg/ requires shutdown or restart).
pub trait Terminal {
    fn is_terminal(&self) -> bool;
}

/// Indicates an `Iterator` or `Stream` has ended.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize, Serialize,
)]
pub struct FeedEnded;
