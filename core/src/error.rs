use crate::types::TableKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatagenError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Step '{step}' requires table '{missing}', which no earlier step produces")]
    StepOutOfOrder { step: &'static str, missing: TableKind },

    #[error("Table '{table}' is not resident in the dataset")]
    MissingTable { table: TableKind },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatagenError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig { reason: reason.into() }
    }
}

pub type DatagenResult<T> = Result<T, DatagenError>;
