//! Reserved categories and limits the services enforce.

use serde::{Deserialize, Serialize};

use crate::domain::catalog::ModuleCatalog;
use crate::domain::entities::{Actor, Audit, Category, CategoryType};

/// A system category with a fixed, well-known id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedCategory {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl ReservedCategory {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    /// Category row for seeding a store.
    pub fn to_category(&self, sort_weight: u64, using: bool, actor: &Actor) -> Category {
        Category {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            using,
            required: false,
            kind: CategoryType::System,
            sort_weight,
            audit: Audit::new(actor),
        }
    }
}

/// The three system categories.
///
/// `department` always reports every module as selected and required.
/// `info_system` is the only system category whose activation may change; it is gated by
/// the linked-entry registry instead of its own tree and does not count against the
/// active-category cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedCategories {
    pub department: ReservedCategory,
    pub info_system: ReservedCategory,
    pub subject: ReservedCategory,
}

pub const DEPARTMENT_ID: &str = "00000000-0000-0000-0000-000000000001";
pub const INFO_SYSTEM_ID: &str = "00000000-0000-0000-0000-000000000002";
pub const SUBJECT_ID: &str = "00000000-0000-0000-0000-000000000003";

impl Default for ReservedCategories {
    fn default() -> Self {
        Self {
            department: ReservedCategory::new(
                DEPARTMENT_ID,
                "Department",
                "Organizational structure",
            ),
            info_system: ReservedCategory::new(
                INFO_SYSTEM_ID,
                "Information System",
                "Registered information systems",
            ),
            subject: ReservedCategory::new(SUBJECT_ID, "Subject Domain", "Business subject areas"),
        }
    }
}

impl ReservedCategories {
    pub fn all(&self) -> [&ReservedCategory; 3] {
        [&self.department, &self.info_system, &self.subject]
    }

    pub fn is_reserved(&self, id: &str) -> bool {
        self.all().iter().any(|c| c.id == id)
    }

    pub fn is_department(&self, id: &str) -> bool {
        self.department.id == id
    }

    pub fn is_info_system(&self, id: &str) -> bool {
        self.info_system.id == id
    }
}

/// Numeric bounds on categories and trees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Limits {
    /// Levels from root to leaf, counting the root
    pub max_depth: usize,
    pub max_customize_categories: usize,
    /// Customize categories that may be active at once
    pub max_using_categories: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 5,
            max_customize_categories: 20,
            max_using_categories: 10,
        }
    }
}

/// Everything the services need to know that is fixed per deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreePolicy {
    pub limits: Limits,
    pub reserved: ReservedCategories,
    pub catalog: ModuleCatalog,
}

impl TreePolicy {
    pub fn new(limits: Limits, reserved: ReservedCategories) -> Self {
        Self {
            limits,
            reserved,
            catalog: ModuleCatalog::standard(),
        }
    }
}
