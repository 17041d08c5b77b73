use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("store is closed")]
    Closed,

    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("duplicate key in {collection}: {field}")]
    DuplicateKey { collection: String, field: String },

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("storage error: {0}")]
    Storage(String),
}
