//! Topic repository contract and SQLite implementation.
//!
//! # Invariants
//! - Identity is generated here, on `save`, never by callers.
//! - Read paths reject out-of-range persisted values instead of masking them.

use super::session_repo::{parse_session_row, SESSION_COLUMNS};
use super::{parse_uuid, EntityKind, RepoError, RepoResult};
use crate::model::session::{SessionId, StudySession};
use crate::model::topic::{Difficulty, NewTopic, Topic, TopicId};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const TOPIC_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    description,
    difficulty,
    mastery_level
FROM topics";

/// Persistence operations for topics.
pub trait TopicRepository {
    /// Loads one topic or fails with `NotFound`.
    fn find_by_id(&self, id: TopicId) -> RepoResult<Topic>;
    /// Duplicate lookup on (name, description, difficulty). Absence is `None`.
    fn find_by_natural_key(
        &self,
        name: &str,
        description: &str,
        difficulty: Difficulty,
    ) -> RepoResult<Option<Topic>>;
    /// Persists a draft and returns it with its assigned identity.
    fn save(&self, draft: &NewTopic) -> RepoResult<Topic>;
    /// Writes every column of an existing topic.
    fn update(&self, topic: &Topic) -> RepoResult<()>;
    /// Deletes one topic. Links must already be gone.
    fn delete(&self, id: TopicId) -> RepoResult<()>;
    /// All topics ordered by name.
    fn list_all(&self) -> RepoResult<Vec<Topic>>;
    /// Ids of sessions linked to the topic.
    fn session_ids(&self, id: TopicId) -> RepoResult<Vec<SessionId>>;
    /// Sessions linked to the topic, ordered by date.
    fn sessions_of(&self, id: TopicId) -> RepoResult<Vec<StudySession>>;
}

/// SQLite-backed topic repository bound to one unit of work.
pub struct SqliteTopicRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTopicRepository<'conn> {
    pub(crate) fn new(conn: &'conn Connection) -> Self {
        debug_assert!(
            !conn.is_autocommit(),
            "topic repository used outside a unit of work"
        );
        Self { conn }
    }
}

impl TopicRepository for SqliteTopicRepository<'_> {
    fn find_by_id(&self, id: TopicId) -> RepoResult<Topic> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TOPIC_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return parse_topic_row(row);
        }
        Err(RepoError::NotFound {
            entity: EntityKind::Topic,
            id,
        })
    }

    fn find_by_natural_key(
        &self,
        name: &str,
        description: &str,
        difficulty: Difficulty,
    ) -> RepoResult<Option<Topic>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TOPIC_SELECT_SQL}
             WHERE name = ?1
               AND description = ?2
               AND difficulty = ?3
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query(params![name, description, i64::from(difficulty)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_topic_row(row)?));
        }
        Ok(None)
    }

    fn save(&self, draft: &NewTopic) -> RepoResult<Topic> {
        let topic = Topic::from_new(Uuid::new_v4(), draft);
        self.conn.execute(
            "INSERT INTO topics (
                uuid,
                name,
                description,
                difficulty,
                mastery_level
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                topic.id.to_string(),
                topic.name.as_str(),
                topic.description.as_str(),
                i64::from(topic.difficulty),
                i64::from(topic.mastery_level),
            ],
        )?;
        Ok(topic)
    }

    fn update(&self, topic: &Topic) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE topics
             SET
                name = ?2,
                description = ?3,
                difficulty = ?4,
                mastery_level = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                topic.id.to_string(),
                topic.name.as_str(),
                topic.description.as_str(),
                i64::from(topic.difficulty),
                i64::from(topic.mastery_level),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Topic,
                id: topic.id,
            });
        }
        Ok(())
    }

    fn delete(&self, id: TopicId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM topics WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Topic,
                id,
            });
        }
        Ok(())
    }

    fn list_all(&self) -> RepoResult<Vec<Topic>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TOPIC_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut topics = Vec::new();
        while let Some(row) = rows.next()? {
            topics.push(parse_topic_row(row)?);
        }
        Ok(topics)
    }

    fn session_ids(&self, id: TopicId) -> RepoResult<Vec<SessionId>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_uuid
             FROM topic_sessions
             WHERE topic_uuid = ?1
             ORDER BY session_uuid ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            ids.push(parse_uuid(&value, "topic_sessions.session_uuid")?);
        }
        Ok(ids)
    }

    fn sessions_of(&self, id: TopicId) -> RepoResult<Vec<StudySession>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS}
             FROM study_sessions s
             INNER JOIN topic_sessions ts ON ts.session_uuid = s.uuid
             WHERE ts.topic_uuid = ?1
             ORDER BY s.session_date ASC, s.uuid ASC;"
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut sessions = Vec::new();
        while let Some(row) = rows.next()? {
            sessions.push(parse_session_row(row)?);
        }
        Ok(sessions)
    }
}

/// Column list shared by joined topic reads, aliased to the bare names.
pub(crate) const TOPIC_COLUMNS: &str = "t.uuid AS uuid,
    t.name AS name,
    t.description AS description,
    t.difficulty AS difficulty,
    t.mastery_level AS mastery_level";

pub(crate) fn parse_topic_row(row: &Row<'_>) -> RepoResult<Topic> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "topics.uuid")?;

    let raw_difficulty: i64 = row.get("difficulty")?;
    let difficulty = Difficulty::new(raw_difficulty).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid difficulty `{raw_difficulty}` in topics.difficulty"
        ))
    })?;

    let raw_mastery: i64 = row.get("mastery_level")?;
    let mastery_level = u32::try_from(raw_mastery).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid mastery level `{raw_mastery}` in topics.mastery_level"
        ))
    })?;

    Ok(Topic {
        id,
        name: row.get("name")?,
        description: row.get("description")?,
        difficulty,
        mastery_level,
    })
}
