//! Domain-level error types.
//!
//! `ValidationError` covers malformed input caught while building a draft.
//! `StateError` covers operations that are well-formed but not allowed in
//! the entity's current state.

use crate::model::session::SessionId;
use crate::model::topic::TopicId;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Malformed or out-of-range input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Topic name is empty after trim.
    BlankTopicName,
    /// Difficulty outside `1..=5`.
    DifficultyOutOfRange(i64),
    /// Duration must be a positive number of minutes.
    NonPositiveDuration(i64),
    /// Duration does not fit the storage column.
    DurationTooLarge(i64),
    /// Session date lies before the day of creation.
    DateInPast { date: NaiveDate, today: NaiveDate },
    /// A session must be created with at least one topic.
    NoTopicsForSession,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTopicName => write!(f, "topic name must not be blank"),
            Self::DifficultyOutOfRange(value) => {
                write!(f, "difficulty must be between 1 and 5, got {value}")
            }
            Self::NonPositiveDuration(value) => {
                write!(f, "duration must be a positive number of minutes, got {value}")
            }
            Self::DurationTooLarge(value) => write!(f, "duration is too large: {value}"),
            Self::DateInPast { date, today } => {
                write!(f, "session date {date} is before today ({today})")
            }
            Self::NoTopicsForSession => write!(f, "a session needs at least one topic"),
        }
    }
}

impl Error for ValidationError {}

/// Operation rejected by the current entity state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Session is complete; its topics and fields are frozen.
    SessionCompleted(SessionId),
    /// Removing this link would leave the session without topics.
    LastTopic {
        session_id: SessionId,
        topic_id: TopicId,
    },
    /// Topic and session are not linked.
    NotLinked {
        session_id: SessionId,
        topic_id: TopicId,
    },
}

impl Display for StateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionCompleted(id) => write!(f, "session is already completed: {id}"),
            Self::LastTopic {
                session_id,
                topic_id,
            } => write!(
                f,
                "topic {topic_id} is the last topic of session {session_id}"
            ),
            Self::NotLinked {
                session_id,
                topic_id,
            } => write!(
                f,
                "topic {topic_id} is not linked to session {session_id}"
            ),
        }
    }
}

impl Error for StateError {}
