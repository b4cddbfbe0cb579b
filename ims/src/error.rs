use ims_data::error::DataError;
use ims_instrument::error::ReferenceError;
use ims_inventory::error::InventoryError;
use ims_limits::LimitError;
use ims_workflow::error::WorkflowError;
use thiserror::Error;

/// Errors surfaced by the root `ims` system: everything a component error enum composes into,
/// plus failures wiring the system together from a [`crate::system::config::SystemConfig`].
#[derive(Debug, Error)]
pub enum ImsError {
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Limit(#[from] LimitError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("unknown batch: {0}")]
    UnknownBatch(String),

    #[error("unknown rule market/calculation-type: {market}/{calculation_type}")]
    UnknownMarketConfig { market: String, calculation_type: String },
}
