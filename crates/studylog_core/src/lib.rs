//! Core domain logic for studylog.
//! This crate is the single source of truth for study-tracking invariants.

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod tx;

pub use api::{StudyApi, StudyEvent};
pub use config::{ConfigError, StoreLocation, StudyConfig};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::error::{StateError, ValidationError};
pub use model::scoring::MasteryAward;
pub use model::session::{NewSession, SessionId, StudySession};
pub use model::topic::{Difficulty, NewTopic, Topic, TopicId};
pub use repo::session_repo::SessionRepository;
pub use repo::topic_repo::TopicRepository;
pub use repo::{EntityKind, RepoError, RepoResult};
pub use service::session_service::{CompletionSummary, SessionService};
pub use service::topic_service::TopicService;
pub use service::{ErrorKind, ServiceError, ServiceResult};
pub use tx::{RepositoryContext, TransactionError, TransactionManager, Transactional, UnitOfWork};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
