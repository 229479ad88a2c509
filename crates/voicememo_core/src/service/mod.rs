//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate engine calls, repositories and external collaborators into
//!   capture/ask/project use-cases.
//! - Keep CLI and transport layers decoupled from storage details.

use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod ask_service;
pub mod capture_service;
pub mod external;
pub mod project_service;

use external::ExternalServiceError;

/// Service error for capture/ask/project use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Input text is empty after trimming.
    EmptyInput(&'static str),
    Repo(RepoError),
    External(ExternalServiceError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput(field) => write!(f, "{field} cannot be empty"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::External(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::EmptyInput(_) => None,
            Self::Repo(err) => Some(err),
            Self::External(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ExternalServiceError> for ServiceError {
    fn from(value: ExternalServiceError) -> Self {
        Self::External(value)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
