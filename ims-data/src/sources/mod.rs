/// Reuters/Bloomberg/MarkIT/Ultumus/RIMES reference-data feed normalizers.
pub mod reference_data;

/// Trade execution / contract activity feed normalizer.
pub mod trade_contract;

pub use reference_data::{bloomberg, markit, reuters, rimes, ultumus, ReferenceDataNormalizer};
pub use trade_contract::TradeContractNormalizer;
