//! Infrastructure-level errors

use thiserror::Error;

use crate::application::ApplicationError;

/// Errors raised by store implementations.
///
/// Apart from `DepthExceeded`, these are fatal to the calling operation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("insert or move would exceed max depth {max_depth}")]
    DepthExceeded { max_depth: usize },

    #[error("{table} row not found: {id}")]
    MissingRow { table: &'static str, id: String },

    #[error("{table} row already exists: {id}")]
    Duplicate { table: &'static str, id: String },

    #[error("node {node_id} cannot be moved into its own subtree")]
    Cycle { node_id: String },

    #[error("store lock poisoned")]
    Poisoned,

    #[error("transaction already active")]
    TransactionActive,

    #[error("no active transaction")]
    NoTransaction,

    #[error("snapshot I/O failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot encoding failed: {context}")]
    Encoding {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Infrastructure errors wrap application errors and add I/O-level concerns.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl InfraError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;
