//! Study use-case services.
//!
//! # Responsibility
//! - Orchestrate validation, duplicate checks and link maintenance.
//! - Run every use case inside one unit of work obtained from a
//!   [`crate::tx::Transactional`] source.
//!
//! # Invariants
//! - Services never write storage outside the unit they were given.
//! - A service built on an open [`crate::tx::UnitOfWork`] joins that unit
//!   instead of committing on its own.

use crate::model::error::{StateError, ValidationError};
use crate::repo::{EntityKind, RepoError};
use crate::tx::TransactionError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

mod relation;
pub mod session_service;
pub mod topic_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Coarse error classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Duplicate,
    State,
    TransactionFailure,
}

/// Errors from study use cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Malformed input.
    Validation(ValidationError),
    /// Referenced id does not exist.
    NotFound { entity: EntityKind, id: Uuid },
    /// Natural key already taken by `existing`.
    Duplicate { entity: EntityKind, existing: Uuid },
    /// Operation not allowed in the current state.
    State(StateError),
    /// Store failure while the unit was running.
    Storage(RepoError),
    /// Unit-of-work failure (open, begin, commit, rollback-only).
    Transaction(TransactionError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Duplicate { .. } => ErrorKind::Duplicate,
            Self::State(_) => ErrorKind::State,
            Self::Storage(_) | Self::Transaction(_) => ErrorKind::TransactionFailure,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Duplicate { entity, existing } => {
                write!(f, "an identical {entity} already exists: {existing}")
            }
            Self::State(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Transaction(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::State(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Transaction(err) => Some(err),
            Self::NotFound { .. } | Self::Duplicate { .. } => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StateError> for ServiceError {
    fn from(value: StateError) -> Self {
        Self::State(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Storage(other),
        }
    }
}

impl From<TransactionError> for ServiceError {
    fn from(value: TransactionError) -> Self {
        Self::Transaction(value)
    }
}
