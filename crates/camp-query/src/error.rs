use thiserror::Error;

/// A query string that cannot be turned into a store query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("malformed query: {0}")]
    Malformed(String),

    #[error("field `{0}` cannot be queried")]
    RestrictedField(String),
}
