//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::ApplyScope;

/// Coarse classification of domain errors, for callers mapping to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    NameConflict,
    SystemImmutable,
    LimitExceeded,
    PreconditionFailed,
    InvalidMove,
    MissingModule,
    ImmutableConfig,
}

/// Domain errors represent business rule violations.
/// Returning one means no mutation took place.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("category not found: {0}")]
    CategoryNotFound(String),

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("category name already exists: {0}")]
    CategoryNameConflict(String),

    #[error("node name already exists under parent {parent_id}: {name}")]
    NodeNameConflict { name: String, parent_id: String },

    #[error("system category cannot be modified: {0}")]
    SystemImmutable(String),

    #[error("customize category limit reached: {max}")]
    CategoryLimitExceeded { max: usize },

    #[error("active category limit reached: {max}")]
    CategoryUsingOverMax { max: usize },

    #[error("tree depth limit exceeded: {max_depth}")]
    DepthExceeded { max_depth: usize },

    #[error("category tree has no usable nodes: {0}")]
    CategoryTreeNotExist(String),

    #[error("root node cannot be modified this way: {0}")]
    RootNotAllowedOperate(String),

    #[error("node cannot be moved under itself: {0}")]
    MoveToSelf(String),

    #[error("node {node_id} cannot be moved into its own subtree at {dest_parent_id}")]
    MoveToDescendant {
        node_id: String,
        dest_parent_id: String,
    },

    #[error("node {next_id} is not a child of {parent_id}")]
    NextNotSibling { next_id: String, parent_id: String },

    #[error("module missing from request: {0}")]
    MissingModule(ApplyScope),

    #[error("module listed more than once: {0}")]
    DuplicateModule(ApplyScope),

    #[error("module not enabled in this environment: {0}")]
    ModuleOutOfScope(ApplyScope),

    #[error("module configuration of this category is fixed: {0}")]
    ImmutableConfig(String),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::CategoryNotFound(_) | DomainError::NodeNotFound(_) => ErrorKind::NotFound,
            DomainError::CategoryNameConflict(_) | DomainError::NodeNameConflict { .. } => {
                ErrorKind::NameConflict
            }
            DomainError::SystemImmutable(_) => ErrorKind::SystemImmutable,
            DomainError::CategoryLimitExceeded { .. }
            | DomainError::CategoryUsingOverMax { .. }
            | DomainError::DepthExceeded { .. } => ErrorKind::LimitExceeded,
            DomainError::CategoryTreeNotExist(_) => ErrorKind::PreconditionFailed,
            DomainError::RootNotAllowedOperate(_)
            | DomainError::MoveToSelf(_)
            | DomainError::MoveToDescendant { .. }
            | DomainError::NextNotSibling { .. } => ErrorKind::InvalidMove,
            DomainError::MissingModule(_)
            | DomainError::DuplicateModule(_)
            | DomainError::ModuleOutOfScope(_) => ErrorKind::MissingModule,
            DomainError::ImmutableConfig(_) => ErrorKind::ImmutableConfig,
        }
    }
}
