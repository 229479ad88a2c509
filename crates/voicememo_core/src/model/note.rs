//! Note domain model and extracted entity bag.
//!
//! # Invariants
//! - `text` is immutable after creation.
//! - `project_id` is assigned at creation time only.
//! - Entity categories always exist; missing data is an empty list.

use super::project::ProjectId;
use super::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub type NoteId = Uuid;

/// Fixed set of extraction buckets produced by the entity extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityCategory {
    People,
    Tasks,
    Events,
    Dates,
    Times,
    Locations,
    Items,
    Topics,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 8] = [
        Self::People,
        Self::Tasks,
        Self::Events,
        Self::Dates,
        Self::Times,
        Self::Locations,
        Self::Items,
        Self::Topics,
    ];

    /// Key used in serialized entity payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::People => "people",
            Self::Tasks => "tasks",
            Self::Events => "events",
            Self::Dates => "dates",
            Self::Times => "times",
            Self::Locations => "locations",
            Self::Items => "items",
            Self::Topics => "topics",
        }
    }
}

/// Extracted entities, one ordered list per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityBag {
    pub people: Vec<String>,
    pub tasks: Vec<String>,
    pub events: Vec<String>,
    pub dates: Vec<String>,
    pub times: Vec<String>,
    pub locations: Vec<String>,
    pub items: Vec<String>,
    pub topics: Vec<String>,
}

impl EntityBag {
    /// Builds a bag from loosely-typed JSON.
    ///
    /// Non-object payloads, non-list category values and non-string list items
    /// are treated as absent instead of failing.
    pub fn from_json_value(value: &Value) -> Self {
        let mut bag = Self::default();
        for category in EntityCategory::ALL {
            let values = value
                .get(category.as_str())
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            *bag.values_mut(category) = values;
        }
        bag
    }

    /// Lenient JSON text decoding; malformed input yields an empty bag.
    pub fn from_json_str(raw: &str) -> Self {
        serde_json::from_str::<Value>(raw)
            .map(|value| Self::from_json_value(&value))
            .unwrap_or_default()
    }

    pub fn values(&self, category: EntityCategory) -> &[String] {
        match category {
            EntityCategory::People => &self.people,
            EntityCategory::Tasks => &self.tasks,
            EntityCategory::Events => &self.events,
            EntityCategory::Dates => &self.dates,
            EntityCategory::Times => &self.times,
            EntityCategory::Locations => &self.locations,
            EntityCategory::Items => &self.items,
            EntityCategory::Topics => &self.topics,
        }
    }

    pub fn values_mut(&mut self, category: EntityCategory) -> &mut Vec<String> {
        match category {
            EntityCategory::People => &mut self.people,
            EntityCategory::Tasks => &mut self.tasks,
            EntityCategory::Events => &mut self.events,
            EntityCategory::Dates => &mut self.dates,
            EntityCategory::Times => &mut self.times,
            EntityCategory::Locations => &mut self.locations,
            EntityCategory::Items => &mut self.items,
            EntityCategory::Topics => &mut self.topics,
        }
    }

    /// Iterates every value across all categories in category order.
    pub fn all_values(&self) -> impl Iterator<Item = &str> {
        EntityCategory::ALL
            .into_iter()
            .flat_map(move |category| self.values(category).iter().map(String::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.all_values().next().is_none()
    }
}

/// Stored transcribed/typed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub text: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub word_count: u32,
    pub project_id: Option<ProjectId>,
    pub entities: EntityBag,
}

impl Note {
    /// Creates a note with a generated id and derived word count.
    pub fn new(text: impl Into<String>, created_at: i64) -> Self {
        Self::with_id(Uuid::new_v4(), text, created_at)
    }

    /// Creates a note with a caller-provided id (import paths, fixtures).
    pub fn with_id(id: NoteId, text: impl Into<String>, created_at: i64) -> Self {
        let text = text.into();
        let word_count = count_words(&text);
        Self {
            id,
            text,
            created_at,
            word_count,
            project_id: None,
            entities: EntityBag::default(),
        }
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_entities(mut self, entities: EntityBag) -> Self {
        self.entities = entities;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyNoteText);
        }
        Ok(())
    }
}

/// Whitespace-delimited word count.
pub fn count_words(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}
