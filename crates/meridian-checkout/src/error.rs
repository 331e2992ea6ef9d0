//! # Service Error Type
//!
//! Unified error type for the service layer. Domain guard failures and
//! persistence failures funnel into one enum so callers match on a single
//! type; no variant information is lost on the way through.

use thiserror::Error;

use meridian_core::CoreError;
use meridian_db::DbError;

/// Errors returned by cart and checkout services.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule violation from the core state machine or pricing
    /// engine.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Persistence failure from the database layer.
    #[error(transparent)]
    Db(#[from] DbError),

    /// A referenced aggregate is missing at the service boundary.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },
}

impl EngineError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Result type for service operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_passes_through() {
        let err: EngineError = CoreError::EmptyCart.into();
        assert_eq!(err.to_string(), "cart has no items");
    }

    #[test]
    fn test_not_found_message() {
        let err = EngineError::not_found("Cart", "c-1");
        assert_eq!(err.to_string(), "Cart not found: c-1");
    }
}
