//! Study session repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `study_sessions`.
//! - Own writes to the `topic_sessions` join table.
//!
//! # Invariants
//! - One join row per `(topic, session)` pair; attaching twice is a no-op.
//! - Dates are stored as `YYYY-MM-DD` text.

use super::topic_repo::{parse_topic_row, TOPIC_COLUMNS};
use super::{bool_to_int, parse_uuid, EntityKind, RepoError, RepoResult};
use crate::model::session::{NewSession, SessionId, StudySession};
use crate::model::topic::{Topic, TopicId};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Column list for session reads, aliased so joins can reuse the parser.
pub(crate) const SESSION_COLUMNS: &str = "s.uuid AS uuid,
    s.session_date AS session_date,
    s.duration_minutes AS duration_minutes,
    s.note AS note,
    s.is_complete AS is_complete";

/// Persistence operations for study sessions and their topic links.
pub trait SessionRepository {
    /// Loads one session or fails with `NotFound`.
    fn find_by_id(&self, id: SessionId) -> RepoResult<StudySession>;
    /// Duplicate lookup on (date, duration, note). Absence is `None`.
    fn find_by_natural_key(
        &self,
        date: NaiveDate,
        duration_minutes: u32,
        note: &str,
    ) -> RepoResult<Option<StudySession>>;
    /// Persists a draft and returns it with its assigned identity.
    fn save(&self, draft: &NewSession) -> RepoResult<StudySession>;
    /// Writes every column of an existing session.
    fn update(&self, session: &StudySession) -> RepoResult<()>;
    /// Deletes one session. Links must already be gone.
    fn delete(&self, id: SessionId) -> RepoResult<()>;
    /// All sessions ordered by date.
    fn list_all(&self) -> RepoResult<Vec<StudySession>>;
    /// Ids of topics linked to the session.
    fn topic_ids(&self, id: SessionId) -> RepoResult<Vec<TopicId>>;
    /// Topics linked to the session, ordered by name.
    fn topics_of(&self, id: SessionId) -> RepoResult<Vec<Topic>>;
    /// Inserts the pair. Returns `false` when it already existed.
    fn attach_topic(&self, session_id: SessionId, topic_id: TopicId) -> RepoResult<bool>;
    /// Removes the pair. Returns `false` when it did not exist.
    fn detach_topic(&self, session_id: SessionId, topic_id: TopicId) -> RepoResult<bool>;
}

/// SQLite-backed session repository bound to one unit of work.
pub struct SqliteSessionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSessionRepository<'conn> {
    pub(crate) fn new(conn: &'conn Connection) -> Self {
        debug_assert!(
            !conn.is_autocommit(),
            "session repository used outside a unit of work"
        );
        Self { conn }
    }
}

impl SessionRepository for SqliteSessionRepository<'_> {
    fn find_by_id(&self, id: SessionId) -> RepoResult<StudySession> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM study_sessions s WHERE s.uuid = ?1;"
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return parse_session_row(row);
        }
        Err(RepoError::NotFound {
            entity: EntityKind::Session,
            id,
        })
    }

    fn find_by_natural_key(
        &self,
        date: NaiveDate,
        duration_minutes: u32,
        note: &str,
    ) -> RepoResult<Option<StudySession>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS}
             FROM study_sessions s
             WHERE s.session_date = ?1
               AND s.duration_minutes = ?2
               AND s.note = ?3
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query(params![
            date.format(DATE_FORMAT).to_string(),
            i64::from(duration_minutes),
            note,
        ])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_session_row(row)?));
        }
        Ok(None)
    }

    fn save(&self, draft: &NewSession) -> RepoResult<StudySession> {
        let session = StudySession::from_new(Uuid::new_v4(), draft);
        self.conn.execute(
            "INSERT INTO study_sessions (
                uuid,
                session_date,
                duration_minutes,
                note,
                is_complete
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                session.id.to_string(),
                session.date.format(DATE_FORMAT).to_string(),
                i64::from(session.duration_minutes),
                session.note.as_str(),
                bool_to_int(session.is_complete),
            ],
        )?;
        Ok(session)
    }

    fn update(&self, session: &StudySession) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE study_sessions
             SET
                session_date = ?2,
                duration_minutes = ?3,
                note = ?4,
                is_complete = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                session.id.to_string(),
                session.date.format(DATE_FORMAT).to_string(),
                i64::from(session.duration_minutes),
                session.note.as_str(),
                bool_to_int(session.is_complete),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Session,
                id: session.id,
            });
        }
        Ok(())
    }

    fn delete(&self, id: SessionId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM study_sessions WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Session,
                id,
            });
        }
        Ok(())
    }

    fn list_all(&self) -> RepoResult<Vec<StudySession>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS}
             FROM study_sessions s
             ORDER BY s.session_date ASC, s.uuid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut sessions = Vec::new();
        while let Some(row) = rows.next()? {
            sessions.push(parse_session_row(row)?);
        }
        Ok(sessions)
    }

    fn topic_ids(&self, id: SessionId) -> RepoResult<Vec<TopicId>> {
        let mut stmt = self.conn.prepare(
            "SELECT topic_uuid
             FROM topic_sessions
             WHERE session_uuid = ?1
             ORDER BY topic_uuid ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            ids.push(parse_uuid(&value, "topic_sessions.topic_uuid")?);
        }
        Ok(ids)
    }

    fn topics_of(&self, id: SessionId) -> RepoResult<Vec<Topic>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TOPIC_COLUMNS}
             FROM topics t
             INNER JOIN topic_sessions ts ON ts.topic_uuid = t.uuid
             WHERE ts.session_uuid = ?1
             ORDER BY t.name COLLATE NOCASE ASC, t.uuid ASC;"
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut topics = Vec::new();
        while let Some(row) = rows.next()? {
            topics.push(parse_topic_row(row)?);
        }
        Ok(topics)
    }

    fn attach_topic(&self, session_id: SessionId, topic_id: TopicId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO topic_sessions (topic_uuid, session_uuid)
             VALUES (?1, ?2);",
            params![topic_id.to_string(), session_id.to_string()],
        )?;
        Ok(changed == 1)
    }

    fn detach_topic(&self, session_id: SessionId, topic_id: TopicId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM topic_sessions
             WHERE topic_uuid = ?1
               AND session_uuid = ?2;",
            params![topic_id.to_string(), session_id.to_string()],
        )?;
        Ok(changed == 1)
    }
}

pub(crate) fn parse_session_row(row: &Row<'_>) -> RepoResult<StudySession> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "study_sessions.uuid")?;

    let date_text: String = row.get("session_date")?;
    let date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date `{date_text}` in study_sessions.session_date"
        ))
    })?;

    let raw_duration: i64 = row.get("duration_minutes")?;
    let duration_minutes = u32::try_from(raw_duration)
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid duration `{raw_duration}` in study_sessions.duration_minutes"
            ))
        })?;

    let is_complete = match row.get::<_, i64>("is_complete")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_complete value `{other}` in study_sessions.is_complete"
            )));
        }
    };

    Ok(StudySession {
        id,
        date,
        duration_minutes,
        note: row.get("note")?,
        is_complete,
    })
}
