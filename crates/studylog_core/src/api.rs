//! Event-emitting facade for presentation layers.
//!
//! # Responsibility
//! - Expose the use cases a study UI drives, one call per user action.
//! - Report every outcome as a [`StudyEvent`] on an explicit channel.
//!
//! # Invariants
//! - Calls never panic on service errors; failures become `*Error` events
//!   and are also returned to the caller.
//! - A dropped receiver is not an error. Events are fire-and-forget.
//! - The facade holds no reference to UI objects, only a channel sender.

use crate::model::session::{SessionId, StudySession};
use crate::model::topic::{Topic, TopicId};
use crate::service::session_service::{CompletionSummary, SessionService};
use crate::service::topic_service::TopicService;
use crate::service::ServiceResult;
use crate::tx::Transactional;
use chrono::NaiveDate;
use log::{debug, warn};
use std::sync::mpsc::Sender;

/// Outbound notification for a view collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudyEvent {
    TopicAdded(Topic),
    TopicRemoved(TopicId),
    TopicError(String),
    SessionAdded(StudySession),
    SessionRemoved(SessionId),
    SessionUpdated(StudySession),
    SessionError(String),
    TotalTimeCalculated(u64),
    PercentageCalculated(u8),
}

/// Inbound study use cases with event notifications.
///
/// `T` is cloned once per service, so pass a cheap handle such as
/// `&TransactionManager` or `Arc<TransactionManager>`.
pub struct StudyApi<T: Transactional + Clone> {
    topics: TopicService<T>,
    sessions: SessionService<T>,
    events: Sender<StudyEvent>,
}

impl<T: Transactional + Clone> StudyApi<T> {
    pub fn new(tx: T, events: Sender<StudyEvent>) -> Self {
        Self {
            topics: TopicService::new(tx.clone()),
            sessions: SessionService::new(tx),
            events,
        }
    }

    /// Same as [`StudyApi::new`] with a custom notion of "today".
    pub fn with_clock(tx: T, events: Sender<StudyEvent>, today: fn() -> NaiveDate) -> Self {
        Self {
            topics: TopicService::new(tx.clone()),
            sessions: SessionService::with_clock(tx, today),
            events,
        }
    }

    pub fn topic_service(&self) -> &TopicService<T> {
        &self.topics
    }

    pub fn session_service(&self) -> &SessionService<T> {
        &self.sessions
    }

    pub fn create_topic(
        &self,
        name: &str,
        description: &str,
        difficulty: i64,
        session_ids: &[SessionId],
    ) -> ServiceResult<Topic> {
        let result = self
            .topics
            .create_topic(name, description, difficulty, session_ids);
        self.report(
            &result,
            "create_topic",
            |topic| StudyEvent::TopicAdded(topic.clone()),
            StudyEvent::TopicError,
        );
        result
    }

    pub fn create_session(
        &self,
        date: NaiveDate,
        duration_minutes: i64,
        note: &str,
        topic_ids: &[TopicId],
    ) -> ServiceResult<StudySession> {
        let result = self
            .sessions
            .create_session(date, duration_minutes, note, topic_ids);
        self.report(
            &result,
            "create_session",
            |session| StudyEvent::SessionAdded(session.clone()),
            StudyEvent::SessionError,
        );
        result
    }

    /// Completes a session. The update event carries the completed session.
    pub fn complete_session(&self, id: SessionId) -> ServiceResult<CompletionSummary> {
        let result = self.sessions.complete_session(id);
        self.report(
            &result,
            "complete_session",
            |summary| StudyEvent::SessionUpdated(summary.session.clone()),
            StudyEvent::SessionError,
        );
        result
    }

    pub fn add_topic_to_session(
        &self,
        session_id: SessionId,
        topic_id: TopicId,
    ) -> ServiceResult<StudySession> {
        let result = self.sessions.add_topic(session_id, topic_id);
        self.report(
            &result,
            "add_topic_to_session",
            |session| StudyEvent::SessionUpdated(session.clone()),
            StudyEvent::SessionError,
        );
        result
    }

    pub fn remove_topic_from_session(
        &self,
        session_id: SessionId,
        topic_id: TopicId,
    ) -> ServiceResult<StudySession> {
        let result = self.sessions.remove_topic(session_id, topic_id);
        self.report(
            &result,
            "remove_topic_from_session",
            |session| StudyEvent::SessionUpdated(session.clone()),
            StudyEvent::SessionError,
        );
        result
    }

    pub fn delete_topic(&self, id: TopicId) -> ServiceResult<()> {
        let result = self.topics.delete_topic(id);
        self.report(
            &result,
            "delete_topic",
            |_| StudyEvent::TopicRemoved(id),
            StudyEvent::TopicError,
        );
        result
    }

    pub fn delete_session(&self, id: SessionId) -> ServiceResult<()> {
        let result = self.sessions.delete_session(id);
        self.report(
            &result,
            "delete_session",
            |_| StudyEvent::SessionRemoved(id),
            StudyEvent::SessionError,
        );
        result
    }

    /// Looks up one topic. Only failures are announced.
    pub fn get_topic_by_id(&self, id: TopicId) -> ServiceResult<Topic> {
        let result = self.topics.get_topic_by_id(id);
        self.report_failure(&result, "get_topic_by_id", StudyEvent::TopicError);
        result
    }

    /// Lists all topics. Only failures are announced.
    pub fn get_all_topics(&self) -> ServiceResult<Vec<Topic>> {
        let result = self.topics.get_all_topics();
        self.report_failure(&result, "get_all_topics", StudyEvent::TopicError);
        result
    }

    pub fn calculate_total_time(&self, id: TopicId) -> ServiceResult<u64> {
        let result = self.topics.calculate_total_time(id);
        self.report(
            &result,
            "calculate_total_time",
            |minutes| StudyEvent::TotalTimeCalculated(*minutes),
            StudyEvent::TopicError,
        );
        result
    }

    pub fn calculate_percentage_of_completion(&self, id: TopicId) -> ServiceResult<u8> {
        let result = self.topics.calculate_percentage_of_completion(id);
        self.report(
            &result,
            "calculate_percentage_of_completion",
            |percent| StudyEvent::PercentageCalculated(*percent),
            StudyEvent::TopicError,
        );
        result
    }

    fn report<V>(
        &self,
        result: &ServiceResult<V>,
        action: &'static str,
        on_ok: impl FnOnce(&V) -> StudyEvent,
        on_err: fn(String) -> StudyEvent,
    ) {
        match result {
            Ok(value) => self.emit(on_ok(value)),
            Err(_) => self.report_failure(result, action, on_err),
        }
    }

    fn report_failure<V>(
        &self,
        result: &ServiceResult<V>,
        action: &'static str,
        on_err: fn(String) -> StudyEvent,
    ) {
        if let Err(err) = result {
            warn!(
                "event=api_call module=api status=error action={action} kind={:?} error={err}",
                err.kind()
            );
            self.emit(on_err(err.to_string()));
        }
    }

    fn emit(&self, event: StudyEvent) {
        if self.events.send(event).is_err() {
            debug!("event=api_emit module=api status=skipped reason=receiver_dropped");
        }
    }
}
