//! Error conversion helpers for store calls
//!
//! Provides an extension trait for cleaner error handling with operation context.

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::DomainError;
use crate::infrastructure::{StoreError, StoreResult};

/// Extension trait for converting `StoreResult` to `ApplicationResult` with context.
pub trait StoreResultExt<T> {
    /// Add operation context to a store error.
    ///
    /// Depth violations reported by the store become `DomainError::DepthExceeded`;
    /// everything else is a fatal `OperationFailed`.
    ///
    /// # Example
    /// ```ignore
    /// self.nodes.insert(&node, max_depth)
    ///     .with_store_context("insert node")?;
    /// ```
    fn with_store_context(self, action: &str) -> ApplicationResult<T>;
}

impl<T> StoreResultExt<T> for StoreResult<T> {
    fn with_store_context(self, action: &str) -> ApplicationResult<T> {
        self.map_err(|e| match e {
            StoreError::DepthExceeded { max_depth } => {
                ApplicationError::Domain(DomainError::DepthExceeded { max_depth })
            }
            other => ApplicationError::OperationFailed {
                context: action.to_string(),
                source: Box::new(other),
            },
        })
    }
}
