//! Completion scoring and topic progress figures.
//!
//! # Invariants
//! - A session is scored at most once: completion is rejected when the
//!   session is already complete, before any topic is touched.
//! - Every linked topic is scored independently from the same session.

use crate::model::error::StateError;
use crate::model::session::StudySession;
use crate::model::topic::{Difficulty, Topic, TopicId};
use serde::{Deserialize, Serialize};

const BASE_POINTS: u32 = 10;
const LONG_SESSION_BONUS: u32 = 5;
const MAX_DIFFICULTY_BONUS: u32 = 5;
const SHORT_HARD_SESSION_PENALTY: u32 = 2;
const HARD_DIFFICULTY: u8 = 3;

/// Mastery points granted to one topic by one completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryAward {
    pub topic_id: TopicId,
    pub points: u32,
}

/// Points one topic earns when `session` is completed.
pub fn award_points(session: &StudySession, difficulty: Difficulty) -> u32 {
    let mut points = BASE_POINTS;
    if session.is_long() {
        points += LONG_SESSION_BONUS;
    }
    if difficulty.get() == Difficulty::MAX {
        points += MAX_DIFFICULTY_BONUS;
    }
    if difficulty.get() >= HARD_DIFFICULTY && !session.is_long() {
        points -= SHORT_HARD_SESSION_PENALTY;
    }
    points
}

/// Completes `session`, awarding mastery to every topic in `topics`.
///
/// `topics` must be the session's full topic set. Nothing is mutated when
/// the session is already complete.
pub fn complete_session(
    session: &mut StudySession,
    topics: &mut [Topic],
) -> Result<Vec<MasteryAward>, StateError> {
    session.ensure_mutable()?;

    let mut awards = Vec::with_capacity(topics.len());
    for topic in topics.iter_mut() {
        let points = award_points(session, topic.difficulty);
        topic.award_mastery(points);
        awards.push(MasteryAward {
            topic_id: topic.id,
            points,
        });
    }

    session.mark_complete()?;
    Ok(awards)
}

/// Total study minutes across a topic's sessions.
pub fn total_time(sessions: &[StudySession]) -> u64 {
    sessions
        .iter()
        .map(|session| u64::from(session.duration_minutes))
        .sum()
}

/// Completed share of a topic's sessions, in whole percent.
///
/// Rounds half up. A topic without sessions is at 0%.
pub fn percentage_of_completion(sessions: &[StudySession]) -> u8 {
    let total = sessions.len() as u64;
    if total == 0 {
        return 0;
    }
    let completed = sessions.iter().filter(|session| session.is_complete).count() as u64;
    ((200 * completed + total) / (2 * total)) as u8
}
