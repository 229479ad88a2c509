//! Project domain model.
//!
//! # Invariants
//! - `name` is unique among active projects, compared case-insensitively.
//! - Deleting a project clears `is_active`; the name may then be reused.
//! - The fallback project (`General`) always exists and stays active.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProjectId = Uuid;

/// Name of the project that receives unclassified and orphaned notes.
pub const FALLBACK_PROJECT_NAME: &str = "General";
/// Seeded by the initial migration.
pub const FALLBACK_PROJECT_ID: ProjectId = Uuid::from_u128(1);
pub const DEFAULT_PROJECT_COLOR: &str = "#6b7280";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    /// Display color, `#rrggbb`.
    pub color: String,
    pub is_active: bool,
}

impl Project {
    /// Creates an active project with a generated id and the default color.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into().trim().to_string(),
            description: None,
            color: DEFAULT_PROJECT_COLOR.to_string(),
            is_active: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn is_fallback(&self) -> bool {
        self.id == FALLBACK_PROJECT_ID
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyProjectName);
        }
        Ok(())
    }
}
