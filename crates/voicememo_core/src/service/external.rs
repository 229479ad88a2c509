//! Contracts for external language-model collaborators.
//!
//! Implementations own their endpoints and credentials; the core only sees
//! these traits.

use crate::model::note::EntityBag;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure reported by an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalServiceError {
    /// Collaborator name, e.g. `entity_extractor`.
    pub service: &'static str,
    pub message: String,
}

impl ExternalServiceError {
    pub fn new(service: &'static str, message: impl Into<String>) -> Self {
        Self {
            service,
            message: message.into(),
        }
    }
}

impl Display for ExternalServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.service, self.message)
    }
}

impl Error for ExternalServiceError {}

/// Structured-entity extraction from note text.
pub trait EntityExtractor {
    fn extract(&self, text: &str) -> Result<EntityBag, ExternalServiceError>;
}

/// Natural-language answer composition from a question and rendered context.
pub trait AnswerComposer {
    fn compose(&self, question: &str, context: &str) -> Result<String, ExternalServiceError>;
}

/// Extractor that finds nothing; used when no extraction backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEntityExtractor;

impl EntityExtractor for NoopEntityExtractor {
    fn extract(&self, _text: &str) -> Result<EntityBag, ExternalServiceError> {
        Ok(EntityBag::default())
    }
}
