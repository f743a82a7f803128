//! Relationship rules for the topic↔session association.
//!
//! The association is one set of `(topic, session)` pairs. Both "topics of
//! a session" and "sessions of a topic" are read from it, so symmetry holds
//! by construction. The checks here decide whether a link change is
//! allowed; callers apply the change to storage only after a check passes.
//!
//! # Invariants
//! - A complete session's pairs never change.
//! - A session never loses its last pair.

use crate::model::error::StateError;
use crate::model::session::StudySession;
use crate::model::topic::TopicId;

/// Result of an allowed link request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    /// Pair must be inserted.
    Linked,
    /// Pair already exists; nothing to write.
    AlreadyLinked,
}

/// Checks whether `topic_id` may be linked to `session`.
///
/// `current` is the session's current topic set.
pub fn check_attach(
    session: &StudySession,
    current: &[TopicId],
    topic_id: TopicId,
) -> Result<AttachOutcome, StateError> {
    session.ensure_mutable()?;
    if current.contains(&topic_id) {
        return Ok(AttachOutcome::AlreadyLinked);
    }
    Ok(AttachOutcome::Linked)
}

/// Checks whether `topic_id` may be unlinked from `session`.
///
/// Used for both "remove topic from session" and "remove session from
/// topic": they are the same pair.
pub fn check_detach(
    session: &StudySession,
    current: &[TopicId],
    topic_id: TopicId,
) -> Result<(), StateError> {
    session.ensure_mutable()?;
    if !current.contains(&topic_id) {
        return Err(StateError::NotLinked {
            session_id: session.id,
            topic_id,
        });
    }
    if current.len() <= 1 {
        return Err(StateError::LastTopic {
            session_id: session.id,
            topic_id,
        });
    }
    Ok(())
}
