use thiserror::Error;

use storefront_core::BoxError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Raw storage failure, before classification.
///
/// These are **infrastructure errors**; callers of the storefront never see them
/// directly, only the [`storefront_core::CoreError`] they are classified into.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed row does not exist.
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// A unique key (primary key or `(cart_id, product_id)`) already exists.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A referenced row (cart, product) does not exist.
    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// Any other backend failure (connection, timeout, decoding, poisoned lock).
    #[error("storage failure in {operation}")]
    Backend {
        operation: &'static str,
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn backend(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Backend {
            operation,
            source: source.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
