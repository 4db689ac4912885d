//! catree: ordered category trees with module-configuration overlays
//!
//! Layers, innermost first: `domain` (entities, tree building, module catalog),
//! `application` (services and guards), `infrastructure` (store contracts, memory store,
//! snapshot persistence, DI container), `cli` (argument parsing and output).

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
