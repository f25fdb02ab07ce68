use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid import configuration: {0}")]
    InvalidConfiguration(#[from] serde_json::Error),
    #[error("field mapping has an empty {0}")]
    EmptyMappingField(&'static str),
    #[error("illegal import status transition: {from} -> {to}")]
    IllegalTransition {
        from: crate::ImportStatus,
        to: crate::ImportStatus,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
