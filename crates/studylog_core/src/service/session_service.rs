//! Study session use-case service.
//!
//! # Invariants
//! - Session natural keys (date, duration, note) stay unique.
//! - A session is created together with its first topic link, in one unit.
//! - Completion writes the session flag and every topic award in one unit.

use super::relation::{link, unlink};
use super::{ServiceError, ServiceResult};
use crate::model::error::ValidationError;
use crate::model::scoring::{complete_session, MasteryAward};
use crate::model::session::{NewSession, SessionId, StudySession};
use crate::model::topic::{Topic, TopicId};
use crate::repo::EntityKind;
use crate::tx::{RepositoryContext, Transactional};
use chrono::{Local, NaiveDate};
use log::info;
use serde::{Deserialize, Serialize};

/// Outcome of completing a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub session: StudySession,
    pub awards: Vec<MasteryAward>,
}

/// Session service facade over a unit-of-work source.
pub struct SessionService<T: Transactional> {
    tx: T,
    today: fn() -> NaiveDate,
}

impl<T: Transactional> SessionService<T> {
    /// Creates a service that checks dates against the local calendar day.
    pub fn new(tx: T) -> Self {
        Self::with_clock(tx, local_today)
    }

    /// Creates a service with a custom notion of "today".
    pub fn with_clock(tx: T, today: fn() -> NaiveDate) -> Self {
        Self { tx, today }
    }

    /// Creates a session linked to the given topics.
    ///
    /// # Errors
    /// - `Validation` for a past date, non-positive duration, or no topics.
    /// - `Duplicate` when (date, duration, note) is taken.
    /// - `NotFound` for an unknown topic id.
    pub fn create_session(
        &self,
        date: NaiveDate,
        duration_minutes: i64,
        note: impl Into<String>,
        topic_ids: &[TopicId],
    ) -> ServiceResult<StudySession> {
        let draft = NewSession::new(date, duration_minutes, note, (self.today)())?;
        if topic_ids.is_empty() {
            return Err(ValidationError::NoTopicsForSession.into());
        }

        self.tx
            .run_with_repositories(|repos| -> ServiceResult<StudySession> {
                ensure_session_key_free(repos, &draft, None)?;
                let session = repos.sessions().save(&draft)?;
                for topic_id in topic_ids {
                    link(repos, session.id, *topic_id)?;
                }
                info!(
                    "event=session_create module=service status=ok session_id={} topics={}",
                    session.id,
                    topic_ids.len()
                );
                Ok(session)
            })
    }

    /// Replaces date, duration and note. Rejected once complete.
    pub fn update_session(
        &self,
        id: SessionId,
        date: NaiveDate,
        duration_minutes: i64,
        note: impl Into<String>,
    ) -> ServiceResult<StudySession> {
        let draft = NewSession::new(date, duration_minutes, note, (self.today)())?;
        self.tx
            .run_with_repositories(|repos| -> ServiceResult<StudySession> {
                let mut session = repos.sessions().find_by_id(id)?;
                session.ensure_mutable()?;
                ensure_session_key_free(repos, &draft, Some(id))?;
                session.apply(&draft)?;
                repos.sessions().update(&session)?;
                info!("event=session_update module=service status=ok session_id={id}");
                Ok(session)
            })
    }

    pub fn get_session_by_id(&self, id: SessionId) -> ServiceResult<StudySession> {
        self.tx
            .run_with_sessions(|sessions| sessions.find_by_id(id).map_err(ServiceError::from))
    }

    pub fn get_all_sessions(&self) -> ServiceResult<Vec<StudySession>> {
        self.tx
            .run_with_sessions(|sessions| sessions.list_all().map_err(ServiceError::from))
    }

    /// Topics linked to a session, ordered by name.
    pub fn topics_of(&self, id: SessionId) -> ServiceResult<Vec<Topic>> {
        self.tx
            .run_with_sessions(|sessions| -> ServiceResult<Vec<Topic>> {
                sessions.find_by_id(id)?;
                sessions.topics_of(id).map_err(ServiceError::from)
            })
    }

    /// Links a topic to a session and returns the session as committed.
    /// Linking an existing pair is a no-op.
    pub fn add_topic(
        &self,
        session_id: SessionId,
        topic_id: TopicId,
    ) -> ServiceResult<StudySession> {
        self.tx
            .run_with_repositories(|repos| -> ServiceResult<StudySession> {
                link(repos, session_id, topic_id)?;
                Ok(repos.sessions().find_by_id(session_id)?)
            })
    }

    /// Unlinks a topic from a session and returns the session as committed.
    /// Never removes the last topic.
    pub fn remove_topic(
        &self,
        session_id: SessionId,
        topic_id: TopicId,
    ) -> ServiceResult<StudySession> {
        self.tx
            .run_with_repositories(|repos| -> ServiceResult<StudySession> {
                unlink(repos, session_id, topic_id)?;
                Ok(repos.sessions().find_by_id(session_id)?)
            })
    }

    /// Marks a session complete and awards mastery to each linked topic.
    pub fn complete_session(&self, id: SessionId) -> ServiceResult<CompletionSummary> {
        self.tx
            .run_with_repositories(|repos| -> ServiceResult<CompletionSummary> {
                let mut session = repos.sessions().find_by_id(id)?;
                let mut topics = repos.sessions().topics_of(id)?;
                let awards = complete_session(&mut session, &mut topics)?;

                for topic in &topics {
                    repos.topics().update(topic)?;
                }
                repos.sessions().update(&session)?;

                info!(
                    "event=session_complete module=service status=ok session_id={id} awarded_topics={} total_points={}",
                    awards.len(),
                    awards.iter().map(|award| u64::from(award.points)).sum::<u64>()
                );
                Ok(CompletionSummary { session, awards })
            })
    }

    /// Detaches a session from all its topics, then deletes it.
    ///
    /// Completed sessions may be deleted; awarded mastery stays.
    pub fn delete_session(&self, id: SessionId) -> ServiceResult<()> {
        self.tx.run_with_repositories(|repos| -> ServiceResult<()> {
            repos.sessions().find_by_id(id)?;
            let topic_ids = repos.sessions().topic_ids(id)?;
            for topic_id in &topic_ids {
                repos.sessions().detach_topic(id, *topic_id)?;
            }
            repos.sessions().delete(id)?;
            info!(
                "event=session_delete module=service status=ok session_id={id} detached_topics={}",
                topic_ids.len()
            );
            Ok(())
        })
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

fn ensure_session_key_free(
    repos: &RepositoryContext<'_>,
    draft: &NewSession,
    editing: Option<SessionId>,
) -> ServiceResult<()> {
    let existing = repos.sessions().find_by_natural_key(
        draft.date,
        draft.duration_minutes,
        draft.note.as_str(),
    )?;
    match existing {
        Some(found) if Some(found.id) != editing => Err(ServiceError::Duplicate {
            entity: EntityKind::Session,
            existing: found.id,
        }),
        _ => Ok(()),
    }
}
