use chrono::NaiveDate;
use studylog_core::{
    EntityKind, ErrorKind, MasteryAward, ServiceError, SessionService, StateError, Topic,
    TopicService, TransactionManager, ValidationError,
};
use uuid::Uuid;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 6, 15).unwrap()
}

fn topic(manager: &TransactionManager, name: &str, difficulty: i64) -> Topic {
    TopicService::new(manager)
        .create_topic(name, "", difficulty, &[])
        .unwrap()
}

fn mastery(manager: &TransactionManager, topic: &Topic) -> u32 {
    TopicService::new(manager)
        .get_topic_by_id(topic.id)
        .unwrap()
        .mastery_level
}

#[test]
fn create_session_links_every_listed_topic() {
    let manager = TransactionManager::in_memory().unwrap();
    let sessions = SessionService::new(&manager);
    let a = topic(&manager, "A", 1);
    let b = topic(&manager, "B", 2);

    let session = sessions
        .create_session(day(2100, 1, 1), 60, "x", &[a.id, b.id])
        .unwrap();

    assert!(!session.is_complete);
    assert_eq!(sessions.get_session_by_id(session.id).unwrap(), session);
    assert_eq!(sessions.topics_of(session.id).unwrap(), vec![a.clone(), b.clone()]);
    let topics = TopicService::new(&manager);
    assert_eq!(topics.sessions_of(a.id).unwrap(), vec![session.clone()]);
    assert_eq!(topics.sessions_of(b.id).unwrap(), vec![session]);
}

#[test]
fn creating_identical_session_twice_is_duplicate() {
    let manager = TransactionManager::in_memory().unwrap();
    let sessions = SessionService::new(&manager);
    let a = topic(&manager, "A", 1);

    let first = sessions
        .create_session(day(2100, 1, 1), 60, "x", &[a.id])
        .unwrap();
    let err = sessions
        .create_session(day(2100, 1, 1), 60, "x", &[a.id])
        .unwrap_err();

    match err {
        ServiceError::Duplicate { entity, existing } => {
            assert_eq!(entity, EntityKind::Session);
            assert_eq!(existing, first.id);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(sessions.get_all_sessions().unwrap().len(), 1);
}

#[test]
fn create_session_validates_input() {
    let manager = TransactionManager::in_memory().unwrap();
    let sessions = SessionService::with_clock(&manager, fixed_today);
    let a = topic(&manager, "A", 1);

    let no_topics = sessions
        .create_session(day(2100, 1, 1), 60, "", &[])
        .unwrap_err();
    assert!(matches!(
        no_topics,
        ServiceError::Validation(ValidationError::NoTopicsForSession)
    ));

    let zero = sessions
        .create_session(day(2100, 1, 1), 0, "", &[a.id])
        .unwrap_err();
    assert!(matches!(
        zero,
        ServiceError::Validation(ValidationError::NonPositiveDuration(0))
    ));

    let past = sessions
        .create_session(day(2030, 6, 14), 30, "", &[a.id])
        .unwrap_err();
    assert!(matches!(
        past,
        ServiceError::Validation(ValidationError::DateInPast { .. })
    ));

    // "Today" itself is allowed.
    sessions
        .create_session(fixed_today(), 30, "", &[a.id])
        .unwrap();
}

#[test]
fn create_session_with_unknown_topic_persists_nothing() {
    let manager = TransactionManager::in_memory().unwrap();
    let sessions = SessionService::new(&manager);
    let a = topic(&manager, "A", 1);
    let missing = Uuid::new_v4();

    let err = sessions
        .create_session(day(2100, 1, 1), 30, "", &[a.id, missing])
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::NotFound { entity: EntityKind::Topic, id } if id == missing
    ));
    assert!(sessions.get_all_sessions().unwrap().is_empty());
    assert!(TopicService::new(&manager)
        .sessions_of(a.id)
        .unwrap()
        .is_empty());
}

#[test]
fn completing_long_session_on_hardest_topic_awards_twenty() {
    let manager = TransactionManager::in_memory().unwrap();
    let sessions = SessionService::new(&manager);
    let hard = topic(&manager, "Hard", 5);
    let session = sessions
        .create_session(day(2100, 1, 1), 120, "", &[hard.id])
        .unwrap();

    let summary = sessions.complete_session(session.id).unwrap();

    assert!(summary.session.is_complete);
    assert_eq!(
        summary.awards,
        vec![MasteryAward {
            topic_id: hard.id,
            points: 20
        }]
    );
    assert_eq!(mastery(&manager, &hard), 20);
    assert!(sessions.get_session_by_id(session.id).unwrap().is_complete);
}

#[test]
fn completing_short_session_on_hard_topic_awards_eight() {
    let manager = TransactionManager::in_memory().unwrap();
    let sessions = SessionService::new(&manager);
    let medium = topic(&manager, "Medium", 3);
    let session = sessions
        .create_session(day(2100, 1, 1), 60, "", &[medium.id])
        .unwrap();

    sessions.complete_session(session.id).unwrap();

    assert_eq!(mastery(&manager, &medium), 8);
}

#[test]
fn completion_scores_each_linked_topic_independently() {
    let manager = TransactionManager::in_memory().unwrap();
    let sessions = SessionService::new(&manager);
    let easy = topic(&manager, "Easy", 1);
    let hardest = topic(&manager, "Hardest", 5);
    let session = sessions
        .create_session(day(2100, 1, 1), 30, "", &[easy.id, hardest.id])
        .unwrap();

    let summary = sessions.complete_session(session.id).unwrap();

    assert_eq!(summary.awards.len(), 2);
    assert_eq!(mastery(&manager, &easy), 10);
    assert_eq!(mastery(&manager, &hardest), 13);
}

#[test]
fn completing_twice_is_rejected_without_double_award() {
    let manager = TransactionManager::in_memory().unwrap();
    let sessions = SessionService::new(&manager);
    let hard = topic(&manager, "Hard", 5);
    let session = sessions
        .create_session(day(2100, 1, 1), 120, "", &[hard.id])
        .unwrap();

    sessions.complete_session(session.id).unwrap();
    let err = sessions.complete_session(session.id).unwrap_err();

    assert!(matches!(
        err,
        ServiceError::State(StateError::SessionCompleted(id)) if id == session.id
    ));
    assert_eq!(mastery(&manager, &hard), 20);
}

#[test]
fn completed_session_is_frozen() {
    let manager = TransactionManager::in_memory().unwrap();
    let sessions = SessionService::new(&manager);
    let a = topic(&manager, "A", 1);
    let b = topic(&manager, "B", 1);
    let c = topic(&manager, "C", 1);
    let session = sessions
        .create_session(day(2100, 1, 1), 30, "", &[a.id, b.id])
        .unwrap();
    sessions.complete_session(session.id).unwrap();

    let add = sessions.add_topic(session.id, c.id).unwrap_err();
    assert_eq!(add.kind(), ErrorKind::State);

    let remove = sessions.remove_topic(session.id, b.id).unwrap_err();
    assert_eq!(remove.kind(), ErrorKind::State);

    let edit = sessions
        .update_session(session.id, day(2100, 1, 2), 45, "edited")
        .unwrap_err();
    assert_eq!(edit.kind(), ErrorKind::State);

    assert_eq!(sessions.topics_of(session.id).unwrap().len(), 2);
    let stored = sessions.get_session_by_id(session.id).unwrap();
    assert_eq!(stored.duration_minutes, 30);
}

#[test]
fn add_and_remove_topic_keep_symmetry() {
    let manager = TransactionManager::in_memory().unwrap();
    let sessions = SessionService::new(&manager);
    let topics = TopicService::new(&manager);
    let a = topic(&manager, "A", 1);
    let b = topic(&manager, "B", 1);
    let session = sessions
        .create_session(day(2100, 1, 1), 30, "", &[a.id])
        .unwrap();

    let linked = sessions.add_topic(session.id, b.id).unwrap();
    assert_eq!(linked, session);
    sessions.add_topic(session.id, b.id).unwrap();
    assert_eq!(sessions.topics_of(session.id).unwrap().len(), 2);
    assert_eq!(topics.sessions_of(b.id).unwrap().len(), 1);

    let unlinked = sessions.remove_topic(session.id, a.id).unwrap();
    assert_eq!(unlinked, session);
    assert!(topics.sessions_of(a.id).unwrap().is_empty());
    assert_eq!(sessions.topics_of(session.id).unwrap(), vec![b.clone()]);

    let err = sessions.remove_topic(session.id, b.id).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::State(StateError::LastTopic { .. })
    ));
    assert_eq!(sessions.topics_of(session.id).unwrap(), vec![b]);
}

#[test]
fn add_topic_with_unknown_ids_is_not_found() {
    let manager = TransactionManager::in_memory().unwrap();
    let sessions = SessionService::new(&manager);
    let a = topic(&manager, "A", 1);
    let session = sessions
        .create_session(day(2100, 1, 1), 30, "", &[a.id])
        .unwrap();

    let unknown_topic = sessions.add_topic(session.id, Uuid::new_v4()).unwrap_err();
    assert!(matches!(
        unknown_topic,
        ServiceError::NotFound {
            entity: EntityKind::Topic,
            ..
        }
    ));

    let unknown_session = sessions.add_topic(Uuid::new_v4(), a.id).unwrap_err();
    assert!(matches!(
        unknown_session,
        ServiceError::NotFound {
            entity: EntityKind::Session,
            ..
        }
    ));
}

#[test]
fn delete_session_detaches_topics_and_keeps_mastery() {
    let manager = TransactionManager::in_memory().unwrap();
    let sessions = SessionService::new(&manager);
    let topics = TopicService::new(&manager);
    let hard = topic(&manager, "Hard", 5);
    let session = sessions
        .create_session(day(2100, 1, 1), 120, "", &[hard.id])
        .unwrap();
    sessions.complete_session(session.id).unwrap();

    sessions.delete_session(session.id).unwrap();

    assert_eq!(
        sessions.get_session_by_id(session.id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert!(topics.sessions_of(hard.id).unwrap().is_empty());
    assert_eq!(mastery(&manager, &hard), 20);
    assert_eq!(
        sessions.delete_session(session.id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn update_session_rechecks_natural_key() {
    let manager = TransactionManager::in_memory().unwrap();
    let sessions = SessionService::new(&manager);
    let a = topic(&manager, "A", 1);
    let taken = sessions
        .create_session(day(2100, 1, 1), 60, "taken", &[a.id])
        .unwrap();
    let editable = sessions
        .create_session(day(2100, 1, 2), 60, "editable", &[a.id])
        .unwrap();

    let err = sessions
        .update_session(editable.id, day(2100, 1, 1), 60, "taken")
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Duplicate { existing, .. } if existing == taken.id
    ));

    let updated = sessions
        .update_session(editable.id, day(2100, 1, 3), 90, "moved")
        .unwrap();
    assert_eq!(updated.date, day(2100, 1, 3));
    assert_eq!(updated.duration_minutes, 90);
    assert_eq!(sessions.get_session_by_id(editable.id).unwrap(), updated);
    assert_eq!(sessions.topics_of(editable.id).unwrap(), vec![a]);
}

#[test]
fn get_all_sessions_orders_by_date() {
    let manager = TransactionManager::in_memory().unwrap();
    let sessions = SessionService::new(&manager);
    let a = topic(&manager, "A", 1);
    sessions
        .create_session(day(2100, 5, 1), 30, "later", &[a.id])
        .unwrap();
    sessions
        .create_session(day(2100, 1, 1), 30, "sooner", &[a.id])
        .unwrap();

    let notes: Vec<_> = sessions
        .get_all_sessions()
        .unwrap()
        .into_iter()
        .map(|session| session.note)
        .collect();
    assert_eq!(notes, vec!["sooner", "later"]);
}
