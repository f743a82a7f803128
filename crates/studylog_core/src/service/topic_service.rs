//! Topic use-case service.
//!
//! # Invariants
//! - Topic natural keys (name, description, difficulty) stay unique.
//! - Deleting a topic never strands a session without topics and never
//!   touches a completed session.

use super::relation::{link, unlink};
use super::{ServiceError, ServiceResult};
use crate::model::association::check_detach;
use crate::model::scoring::{percentage_of_completion, total_time};
use crate::model::session::{SessionId, StudySession};
use crate::model::topic::{NewTopic, Topic, TopicId};
use crate::repo::EntityKind;
use crate::tx::{RepositoryContext, Transactional};
use log::info;

/// Topic service facade over a unit-of-work source.
pub struct TopicService<T: Transactional> {
    tx: T,
}

impl<T: Transactional> TopicService<T> {
    /// Creates a service that runs each call in a unit from `tx`.
    pub fn new(tx: T) -> Self {
        Self { tx }
    }

    /// Creates a topic and links it to existing sessions.
    ///
    /// # Errors
    /// - `Validation` for a blank name or difficulty outside `1..=5`.
    /// - `Duplicate` when the natural key is taken.
    /// - `NotFound` for an unknown session id.
    /// - `State` when a listed session is already complete.
    pub fn create_topic(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        difficulty: i64,
        session_ids: &[SessionId],
    ) -> ServiceResult<Topic> {
        let draft = NewTopic::new(name, description, difficulty)?;
        self.tx.run_with_repositories(|repos| -> ServiceResult<Topic> {
            ensure_topic_key_free(repos, &draft, None)?;
            let topic = repos.topics().save(&draft)?;
            for session_id in session_ids {
                link(repos, *session_id, topic.id)?;
            }
            info!(
                "event=topic_create module=service status=ok topic_id={} sessions={}",
                topic.id,
                session_ids.len()
            );
            Ok(topic)
        })
    }

    /// Replaces name, description and difficulty of a topic.
    pub fn update_topic(
        &self,
        id: TopicId,
        name: impl Into<String>,
        description: impl Into<String>,
        difficulty: i64,
    ) -> ServiceResult<Topic> {
        let draft = NewTopic::new(name, description, difficulty)?;
        self.tx.run_with_repositories(|repos| -> ServiceResult<Topic> {
            let mut topic = repos.topics().find_by_id(id)?;
            ensure_topic_key_free(repos, &draft, Some(id))?;
            topic.apply(&draft);
            repos.topics().update(&topic)?;
            info!("event=topic_update module=service status=ok topic_id={id}");
            Ok(topic)
        })
    }

    pub fn get_topic_by_id(&self, id: TopicId) -> ServiceResult<Topic> {
        self.tx
            .run_with_topics(|topics| topics.find_by_id(id).map_err(ServiceError::from))
    }

    pub fn get_all_topics(&self) -> ServiceResult<Vec<Topic>> {
        self.tx
            .run_with_topics(|topics| topics.list_all().map_err(ServiceError::from))
    }

    /// Sessions linked to a topic, ordered by date.
    pub fn sessions_of(&self, id: TopicId) -> ServiceResult<Vec<StudySession>> {
        self.tx.run_with_topics(|topics| -> ServiceResult<Vec<StudySession>> {
            topics.find_by_id(id)?;
            topics.sessions_of(id).map_err(ServiceError::from)
        })
    }

    /// Links a session to a topic. Linking an existing pair is a no-op.
    pub fn add_session(&self, topic_id: TopicId, session_id: SessionId) -> ServiceResult<()> {
        self.tx
            .run_with_repositories(|repos| link(repos, session_id, topic_id).map(|_| ()))
    }

    /// Unlinks a session from a topic.
    ///
    /// Fails with `State` when the topic is the session's last one or the
    /// session is complete.
    pub fn remove_session(&self, topic_id: TopicId, session_id: SessionId) -> ServiceResult<()> {
        self.tx
            .run_with_repositories(|repos| unlink(repos, session_id, topic_id))
    }

    /// Detaches a topic from all its sessions, then deletes it.
    ///
    /// Every session is checked before the first link is removed, so a
    /// rejected delete leaves nothing half-detached even inside a caller's
    /// larger unit.
    pub fn delete_topic(&self, id: TopicId) -> ServiceResult<()> {
        self.tx.run_with_repositories(|repos| -> ServiceResult<()> {
            repos.topics().find_by_id(id)?;
            let session_ids = repos.topics().session_ids(id)?;

            for session_id in &session_ids {
                let session = repos.sessions().find_by_id(*session_id)?;
                let current = repos.sessions().topic_ids(*session_id)?;
                check_detach(&session, &current, id)?;
            }
            for session_id in &session_ids {
                repos.sessions().detach_topic(*session_id, id)?;
            }

            repos.topics().delete(id)?;
            info!(
                "event=topic_delete module=service status=ok topic_id={id} detached_sessions={}",
                session_ids.len()
            );
            Ok(())
        })
    }

    /// Sum of session minutes for a topic.
    pub fn calculate_total_time(&self, id: TopicId) -> ServiceResult<u64> {
        let sessions = self.sessions_of(id)?;
        Ok(total_time(&sessions))
    }

    /// Share of a topic's sessions that are complete, in whole percent.
    pub fn calculate_percentage_of_completion(&self, id: TopicId) -> ServiceResult<u8> {
        let sessions = self.sessions_of(id)?;
        Ok(percentage_of_completion(&sessions))
    }

    /// Administrative mastery correction. Floors at zero.
    pub fn correct_mastery(&self, id: TopicId, points: u32) -> ServiceResult<Topic> {
        self.tx.run_with_topics(|topics| -> ServiceResult<Topic> {
            let mut topic = topics.find_by_id(id)?;
            let before = topic.mastery_level;
            topic.reduce_mastery(points);
            topics.update(&topic)?;
            info!(
                "event=topic_mastery_correct module=service status=ok topic_id={id} before={before} after={}",
                topic.mastery_level
            );
            Ok(topic)
        })
    }
}

fn ensure_topic_key_free(
    repos: &RepositoryContext<'_>,
    draft: &NewTopic,
    editing: Option<TopicId>,
) -> ServiceResult<()> {
    let existing = repos.topics().find_by_natural_key(
        draft.name.as_str(),
        draft.description.as_str(),
        draft.difficulty,
    )?;
    match existing {
        Some(found) if Some(found.id) != editing => Err(ServiceError::Duplicate {
            entity: EntityKind::Topic,
            existing: found.id,
        }),
        _ => Ok(()),
    }
}
