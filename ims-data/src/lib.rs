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

//! # IMS-Data
//! Feed Normalizers (§4.2): one [`normalizer::SourceNormalizer`] per upstream source (Reuters,
//! Bloomberg, MarkIT, Ultumus, RIMES, trade/contract), schema-validating, resolving external
//! identifiers against the [`ims_instrument::ReferenceStore`], and emitting
//! [`event::CanonicalEvent`]s.
//!
//! Both the batch (`processBatch`) and realtime (`handleRealtime`) paths share the same
//! duplicate-detection and identifier-resolution logic, so behaviour is identical regardless of
//! transport.

/// Batch processing: [`batch::BatchReport`], [`batch::BatchSelector`], duplicate detection.
pub mod batch;

/// All [`Error`](std::error::Error)s generated in `ims-data`.
pub mod error;

/// [`event::CanonicalEvent`] and [`event::Envelope`] — the normalized output of every source.
pub mod event;

/// The [`normalizer::SourceNormalizer`] contract implemented once per source.
pub mod normalizer;

/// Shared `key=value` record-line parsing helpers used by every source normalizer.
pub mod record;

/// Which upstream feed a record or event originated from, and its conflict-resolution priority.
pub mod source;

/// Per-source [`normalizer::SourceNormalizer`] implementations.
pub mod sources;
