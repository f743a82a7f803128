//! Study domain model.
//!
//! # Responsibility
//! - Define topics, study sessions, and their transient drafts.
//! - Own the relationship checks and the completion scoring rules.
//!
//! # Invariants
//! - Drafts are validated at construction; persisted entities come only
//!   from repositories.
//! - A session's topic set is frozen once the session is complete.
//! - Mastery only grows through completion awards, except for the
//!   administrative floor-at-zero correction.

pub mod association;
pub mod error;
pub mod scoring;
pub mod session;
pub mod topic;
