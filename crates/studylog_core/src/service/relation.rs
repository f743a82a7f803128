//! The one place where topic↔session links are changed.
//!
//! Both services route every link change through these functions, so the
//! "topic side" and "session side" operations share identical checks.

use super::ServiceResult;
use crate::model::association::{check_attach, check_detach, AttachOutcome};
use crate::model::session::SessionId;
use crate::model::topic::TopicId;
use crate::tx::RepositoryContext;
use log::debug;

/// Links the pair after both sides exist and the session accepts it.
pub(super) fn link(
    repos: &RepositoryContext<'_>,
    session_id: SessionId,
    topic_id: TopicId,
) -> ServiceResult<AttachOutcome> {
    let session = repos.sessions().find_by_id(session_id)?;
    repos.topics().find_by_id(topic_id)?;

    let current = repos.sessions().topic_ids(session_id)?;
    let outcome = check_attach(&session, &current, topic_id)?;
    if outcome == AttachOutcome::Linked {
        repos.sessions().attach_topic(session_id, topic_id)?;
    }
    debug!(
        "event=link_attach module=service status=ok session_id={session_id} topic_id={topic_id} outcome={outcome:?}"
    );
    Ok(outcome)
}

/// Unlinks the pair when the session may lose this topic.
pub(super) fn unlink(
    repos: &RepositoryContext<'_>,
    session_id: SessionId,
    topic_id: TopicId,
) -> ServiceResult<()> {
    let session = repos.sessions().find_by_id(session_id)?;
    repos.topics().find_by_id(topic_id)?;

    let current = repos.sessions().topic_ids(session_id)?;
    check_detach(&session, &current, topic_id)?;
    repos.sessions().detach_topic(session_id, topic_id)?;
    debug!(
        "event=link_detach module=service status=ok session_id={session_id} topic_id={topic_id}"
    );
    Ok(())
}
