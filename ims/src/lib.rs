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

//! # Inventory Management System
//! The Inventory Management System (IMS) tracks lendable and borrowable securities inventory
//! for a global prime-brokerage: it ingests reference data and trade/contract activity from
//! multiple external feeds, normalises it into canonical events, maintains per-book positions,
//! applies per-market inventory rules, enforces locate/short-sell workflows against live limits,
//! and publishes inventory snapshots downstream.
//!
//! At a high level it provides:
//! * A [`system::System`], wiring the Reference Store, Feed Normalizers, Rule Engine, Inventory
//!   Calculator, Position Engine, Limit Service, Locate Workflow, Short-Sell Gate and Publisher
//!   into one running deployment.
//! * A [`cli::Cli`] operator surface for reprocessing batches, reloading rules, forcing
//!   checkpoints, replaying events and polling component health.
//! * Tracing-based [`logging`] initialisers and [`shutdown`] primitives shared across the whole
//!   ecosystem of `ims-*` crates.

/// Operator CLI surface: `reprocess-batch`, `reload-rules`, `snapshot-now`, `replay-from`,
/// `health`.
pub mod cli;

/// Defines all possible errors surfaced by the root `ims` system.
pub mod error;

/// Provides default IMS Tracing logging initialisers.
pub mod logging;

/// Traits and types related to component shutdowns.
pub mod shutdown;

/// Wires a complete IMS system from a [`system::config::SystemConfig`] and exposes its operator
/// surface.
pub mod system;

pub use error::ImsError;
pub use system::{System, builder::SystemBuilder, config::SystemConfig};
