//! Open unit of work and nested scope reuse.

use super::{RepositoryContext, TransactionError, Transactional};
use log::{debug, warn};
use rusqlite::Connection;
use std::cell::Cell;
use uuid::Uuid;

/// One open atomic scope over a single storage handle.
///
/// Created only by [`super::TransactionManager`]. Running work on it again
/// reuses the same handle and transaction; the manager alone decides
/// whether the unit commits. Not `Sync`: a unit belongs to one task.
pub struct UnitOfWork<'conn> {
    conn: &'conn Connection,
    scope_id: Uuid,
    depth: Cell<u32>,
    rollback_only: Cell<bool>,
}

impl<'conn> UnitOfWork<'conn> {
    pub(crate) fn new(conn: &'conn Connection, scope_id: Uuid) -> Self {
        Self {
            conn,
            scope_id,
            depth: Cell::new(1),
            rollback_only: Cell::new(false),
        }
    }

    /// Raw storage handle, already inside the unit's transaction.
    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    /// Both repositories bound to this unit.
    pub fn repositories(&self) -> RepositoryContext<'conn> {
        RepositoryContext::new(self.conn)
    }

    /// Identifier used in log events for this unit.
    pub fn scope_id(&self) -> Uuid {
        self.scope_id
    }

    /// Number of scopes currently running on this unit; 1 at the outermost.
    pub fn depth(&self) -> u32 {
        self.depth.get()
    }

    /// Whether a nested scope failed, forcing rollback at the outermost.
    pub fn is_rollback_only(&self) -> bool {
        self.rollback_only.get()
    }

    fn mark_rollback_only(&self) {
        if !self.rollback_only.replace(true) {
            warn!(
                "event=uow_mark_rollback_only module=tx status=ok scope_id={} depth={}",
                self.scope_id,
                self.depth.get()
            );
        }
    }
}

impl Transactional for UnitOfWork<'_> {
    fn run_raw<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&UnitOfWork<'_>) -> Result<T, E>,
        E: From<TransactionError>,
    {
        let _nested = NestedScope::enter(self);
        let outcome = work(self);
        if outcome.is_err() {
            self.mark_rollback_only();
        }
        outcome
    }
}

/// Keeps the depth counter balanced even when nested work panics.
struct NestedScope<'a, 'conn> {
    unit: &'a UnitOfWork<'conn>,
}

impl<'a, 'conn> NestedScope<'a, 'conn> {
    fn enter(unit: &'a UnitOfWork<'conn>) -> Self {
        let depth = unit.depth.get() + 1;
        unit.depth.set(depth);
        debug!(
            "event=uow_join module=tx status=ok scope_id={} depth={depth}",
            unit.scope_id
        );
        Self { unit }
    }
}

impl Drop for NestedScope<'_, '_> {
    fn drop(&mut self) {
        self.unit.depth.set(self.unit.depth.get() - 1);
    }
}
