//! Infrastructure layer: store implementations and DI container
//!
//! This layer implements the store and collaborator traits and wires up services.

pub mod di;
pub mod error;
pub mod memory;
pub mod snapshot;
pub mod traits;

pub use error::{InfraError, InfraResult, StoreError, StoreResult};
pub use memory::{MemoryStore, StoreState};
pub use snapshot::SnapshotFile;
