//! Topic domain model.
//!
//! # Invariants
//! - `name` is never blank.
//! - `difficulty` stays within `1..=5`.
//! - `mastery_level` never goes below zero.

use crate::model::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier assigned when a topic is first persisted.
pub type TopicId = Uuid;

/// Topic difficulty on a closed `1..=5` scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Validates a raw difficulty value.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value < i64::from(Self::MIN) || value > i64::from(Self::MAX) {
            return Err(ValidationError::DifficultyOutOfRange(value));
        }
        Ok(Self(value as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Difficulty {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Difficulty> for i64 {
    fn from(value: Difficulty) -> Self {
        i64::from(value.0)
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated topic that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTopic {
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
}

impl NewTopic {
    /// Builds a draft, trimming the name and validating difficulty.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        difficulty: i64,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            name: normalize_topic_name(name.into())?,
            description: description.into(),
            difficulty: Difficulty::new(difficulty)?,
        })
    }
}

/// Persisted topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    /// Cumulative score from completed sessions.
    pub mastery_level: u32,
}

impl Topic {
    /// Attaches an identity to a draft. Mastery starts at zero.
    pub fn from_new(id: TopicId, draft: &NewTopic) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            difficulty: draft.difficulty,
            mastery_level: 0,
        }
    }

    /// Replaces the editable fields with the values of a validated draft.
    pub fn apply(&mut self, draft: &NewTopic) {
        self.name = draft.name.clone();
        self.description = draft.description.clone();
        self.difficulty = draft.difficulty;
    }

    /// Whether this topic carries the given natural key.
    pub fn has_natural_key(&self, draft: &NewTopic) -> bool {
        self.name == draft.name
            && self.description == draft.description
            && self.difficulty == draft.difficulty
    }

    /// Adds completion points.
    pub fn award_mastery(&mut self, points: u32) {
        self.mastery_level = self.mastery_level.saturating_add(points);
    }

    /// Administrative correction. Never drops below zero.
    pub fn reduce_mastery(&mut self, points: u32) {
        self.mastery_level = self.mastery_level.saturating_sub(points);
    }
}

fn normalize_topic_name(name: String) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankTopicName);
    }
    Ok(trimmed.to_string())
}
