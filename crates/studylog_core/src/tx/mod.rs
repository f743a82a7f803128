//! Unit-of-work layer.
//!
//! # Responsibility
//! - Give callers atomic scopes without exposing handle lifecycle.
//! - Offer three views of a scope: raw connection, one repository, or the
//!   joint [`RepositoryContext`].
//!
//! # Invariants
//! - One storage handle per outermost scope; it is released when that scope
//!   ends, never earlier.
//! - Only the outermost scope commits or rolls back, exactly once.
//! - An error from any nested scope makes the whole unit rollback-only.
//! - Scopes are threaded explicitly as values; there is no ambient or
//!   thread-local transaction state.

use crate::db::DbError;
use crate::repo::session_repo::{SessionRepository, SqliteSessionRepository};
use crate::repo::topic_repo::{SqliteTopicRepository, TopicRepository};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

mod manager;
mod unit_of_work;

pub use manager::{StoreTarget, TransactionManager};
pub use unit_of_work::UnitOfWork;

/// Failures of the unit-of-work machinery itself.
#[derive(Debug)]
pub enum TransactionError {
    /// Opening, beginning, committing or rolling back failed in the store.
    Db(DbError),
    /// A nested scope failed and the outer work still returned success.
    RollbackOnly { scope_id: Uuid },
    /// The in-memory store stayed occupied by another scope for too long.
    Busy { waited: Duration },
}

impl Display for TransactionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::RollbackOnly { scope_id } => write!(
                f,
                "unit of work {scope_id} was rolled back because a nested scope failed"
            ),
            Self::Busy { waited } => write!(
                f,
                "in-memory store stayed busy for {} ms",
                waited.as_millis()
            ),
        }
    }
}

impl Error for TransactionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::RollbackOnly { .. } | Self::Busy { .. } => None,
        }
    }
}

impl From<DbError> for TransactionError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for TransactionError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Joint view giving both repositories inside one atomic scope.
pub struct RepositoryContext<'conn> {
    topics: SqliteTopicRepository<'conn>,
    sessions: SqliteSessionRepository<'conn>,
}

impl<'conn> RepositoryContext<'conn> {
    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self {
            topics: SqliteTopicRepository::new(conn),
            sessions: SqliteSessionRepository::new(conn),
        }
    }

    pub fn topics(&self) -> &dyn TopicRepository {
        &self.topics
    }

    pub fn sessions(&self) -> &dyn SessionRepository {
        &self.sessions
    }
}

/// Anything that can run work inside a unit of work.
///
/// [`TransactionManager`] opens a new outermost scope per call.
/// [`UnitOfWork`] reuses itself, so code written against this trait joins
/// whatever unit its caller already opened.
pub trait Transactional {
    /// Runs `work` with raw access to the scope.
    fn run_raw<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&UnitOfWork<'_>) -> Result<T, E>,
        E: From<TransactionError>;

    /// Runs `work` against the topic repository only.
    fn run_with_topics<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn TopicRepository) -> Result<T, E>,
        E: From<TransactionError>,
    {
        self.run_raw(|unit| {
            let repos = unit.repositories();
            work(repos.topics())
        })
    }

    /// Runs `work` against the session repository only.
    fn run_with_sessions<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn SessionRepository) -> Result<T, E>,
        E: From<TransactionError>,
    {
        self.run_raw(|unit| {
            let repos = unit.repositories();
            work(repos.sessions())
        })
    }

    /// Runs `work` with both repositories in one atomic step.
    fn run_with_repositories<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&RepositoryContext<'_>) -> Result<T, E>,
        E: From<TransactionError>,
    {
        self.run_raw(|unit| work(&unit.repositories()))
    }
}

impl<X: Transactional> Transactional for &X {
    fn run_raw<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&UnitOfWork<'_>) -> Result<T, E>,
        E: From<TransactionError>,
    {
        (**self).run_raw(work)
    }
}

impl<X: Transactional> Transactional for Arc<X> {
    fn run_raw<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&UnitOfWork<'_>) -> Result<T, E>,
        E: From<TransactionError>,
    {
        (**self).run_raw(work)
    }
}
