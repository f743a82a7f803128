//! Study session domain model.
//!
//! # Invariants
//! - `duration_minutes` is strictly positive.
//! - `date` is not before the creation day.
//! - `is_complete` only moves from `false` to `true`.

use crate::model::error::{StateError, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier assigned when a session is first persisted.
pub type SessionId = Uuid;

/// Session length at which completion grants the long-session bonus.
pub const LONG_SESSION_MINUTES: u32 = 90;

/// Validated session that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub note: String,
}

impl NewSession {
    /// Builds a draft checked against `today`.
    pub fn new(
        date: NaiveDate,
        duration_minutes: i64,
        note: impl Into<String>,
        today: NaiveDate,
    ) -> Result<Self, ValidationError> {
        if date < today {
            return Err(ValidationError::DateInPast { date, today });
        }
        Ok(Self {
            date,
            duration_minutes: validate_duration(duration_minutes)?,
            note: note.into(),
        })
    }
}

/// Persisted study session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySession {
    pub id: SessionId,
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub note: String,
    pub is_complete: bool,
}

impl StudySession {
    /// Attaches an identity to a draft. Sessions start incomplete.
    pub fn from_new(id: SessionId, draft: &NewSession) -> Self {
        Self {
            id,
            date: draft.date,
            duration_minutes: draft.duration_minutes,
            note: draft.note.clone(),
            is_complete: false,
        }
    }

    /// Fails once the session is complete.
    pub fn ensure_mutable(&self) -> Result<(), StateError> {
        if self.is_complete {
            return Err(StateError::SessionCompleted(self.id));
        }
        Ok(())
    }

    /// Replaces date, duration and note. Rejected after completion.
    pub fn apply(&mut self, draft: &NewSession) -> Result<(), StateError> {
        self.ensure_mutable()?;
        self.date = draft.date;
        self.duration_minutes = draft.duration_minutes;
        self.note = draft.note.clone();
        Ok(())
    }

    /// Whether this session carries the given natural key.
    pub fn has_natural_key(&self, draft: &NewSession) -> bool {
        self.date == draft.date
            && self.duration_minutes == draft.duration_minutes
            && self.note == draft.note
    }

    pub fn is_long(&self) -> bool {
        self.duration_minutes >= LONG_SESSION_MINUTES
    }

    pub(crate) fn mark_complete(&mut self) -> Result<(), StateError> {
        self.ensure_mutable()?;
        self.is_complete = true;
        Ok(())
    }
}

fn validate_duration(value: i64) -> Result<u32, ValidationError> {
    if value <= 0 {
        return Err(ValidationError::NonPositiveDuration(value));
    }
    u32::try_from(value).map_err(|_| ValidationError::DurationTooLarge(value))
}

#[cfg(test)]
mod tests {
    use super::{NewSession, StudySession};
    use crate::model::error::{StateError, ValidationError};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn draft_accepts_today_and_rejects_yesterday() {
        let today = day(2026, 3, 10);
        assert!(NewSession::new(today, 30, "review", today).is_ok());

        let err = NewSession::new(day(2026, 3, 9), 30, "review", today).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DateInPast {
                date: day(2026, 3, 9),
                today
            }
        );
    }

    #[test]
    fn draft_rejects_non_positive_duration() {
        let today = day(2026, 3, 10);
        assert_eq!(
            NewSession::new(today, 0, "", today).unwrap_err(),
            ValidationError::NonPositiveDuration(0)
        );
        assert_eq!(
            NewSession::new(today, -15, "", today).unwrap_err(),
            ValidationError::NonPositiveDuration(-15)
        );
    }

    #[test]
    fn completed_session_rejects_field_edits() {
        let today = day(2026, 3, 10);
        let draft = NewSession::new(today, 45, "chapter 1", today).unwrap();
        let mut session = StudySession::from_new(Uuid::new_v4(), &draft);
        session.mark_complete().unwrap();

        let edit = NewSession::new(today, 60, "chapter 2", today).unwrap();
        assert_eq!(
            session.apply(&edit),
            Err(StateError::SessionCompleted(session.id))
        );
        assert_eq!(session.note, "chapter 1");
    }
}
