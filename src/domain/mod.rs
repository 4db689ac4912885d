//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod catalog;
pub mod entities;
pub mod error;
pub mod ordering;
pub mod policy;

pub use arena::{TreeArena, TreeNode};
pub use builder::{to_nested, to_nested_filtered, NodeTree, TreeBuilder};
pub use catalog::{ModuleCatalog, ModuleNodeDef, ModuleTreeDef};
pub use entities::*;
pub use error::{DomainError, ErrorKind};
pub use policy::{Limits, ReservedCategories, ReservedCategory, TreePolicy};
