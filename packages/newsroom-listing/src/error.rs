use newsroom_index::IndexError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ListingError>;

#[derive(Error, Debug)]
pub enum ListingError {
    /// A category filter names a field the record does not carry
    #[error("Field missing on record {path}: {key}")]
    FieldMissing { key: String, path: String },

    #[error("Index transport failure: {0}")]
    Transport(#[from] IndexError),

    #[error("Invalid session transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },
}

impl ListingError {
    pub fn field_missing(key: impl Into<String>, path: impl Into<String>) -> Self {
        Self::FieldMissing {
            key: key.into(),
            path: path.into(),
        }
    }
}
