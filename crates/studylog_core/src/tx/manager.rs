//! Transaction manager: outermost scopes over storage handles.
//!
//! # Invariants
//! - On a file store every outermost call opens its own connection, so
//!   concurrent callers never share a handle.
//! - On an in-memory store outermost calls take turns on the single kept
//!   handle. Waiting is bounded by the same timeout as SQLite's busy wait.
//! - Transactions begin `IMMEDIATE`, taking the write lock up front so a
//!   lookup-then-insert check and its insert see the same state.
//! - Rollback is attempted only while the transaction is still active, and
//!   a rollback failure never replaces the caller's original error.

use super::{TransactionError, Transactional, UnitOfWork};
use crate::config::StoreLocation;
use crate::db::{open_db, open_db_shared_memory, DbResult, BUSY_TIMEOUT};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::PathBuf;
use std::time::Instant;
use uuid::Uuid;

/// Where the manager opens its handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    /// SQLite database file.
    File(PathBuf),
    /// Named shared-cache in-memory database.
    SharedMemory(String),
}

/// Hands out atomic scopes over the study store.
pub struct TransactionManager {
    target: StoreTarget,
    // In-memory stores: the only handle scopes run on. Shared-cache table
    // locks fail at once instead of waiting, so scopes never overlap here.
    memory_handle: Option<Mutex<Connection>>,
}

impl TransactionManager {
    /// Manager over a database file, created and bootstrapped if needed.
    pub fn open(path: impl Into<PathBuf>) -> DbResult<Self> {
        let path = path.into();
        // Bootstrap once so concurrent first scopes never race on the schema.
        drop(open_db(&path)?);
        info!(
            "event=tx_manager_open module=tx status=ok mode=file path={}",
            path.display()
        );
        Ok(Self {
            target: StoreTarget::File(path),
            memory_handle: None,
        })
    }

    /// Manager over a private in-memory store that lives as long as it does.
    pub fn in_memory() -> DbResult<Self> {
        let name = format!("studylog-{}", Uuid::new_v4());
        let keeper = open_db_shared_memory(&name)?;
        info!("event=tx_manager_open module=tx status=ok mode=memory name={name}");
        Ok(Self {
            target: StoreTarget::SharedMemory(name),
            memory_handle: Some(Mutex::new(keeper)),
        })
    }

    /// Manager for a configured store location.
    pub fn from_location(location: &StoreLocation) -> DbResult<Self> {
        match location {
            StoreLocation::File { path } => Self::open(path.clone()),
            StoreLocation::Memory => Self::in_memory(),
        }
    }

    pub fn target(&self) -> &StoreTarget {
        &self.target
    }
}

impl Transactional for TransactionManager {
    fn run_raw<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&UnitOfWork<'_>) -> Result<T, E>,
        E: From<TransactionError>,
    {
        let scope_id = Uuid::new_v4();

        match (&self.target, &self.memory_handle) {
            (_, Some(handle)) => {
                let waiting_since = Instant::now();
                let Some(conn) = handle.try_lock_for(BUSY_TIMEOUT) else {
                    let waited = waiting_since.elapsed();
                    warn!(
                        "event=uow_begin module=tx status=error scope_id={scope_id} error_code=memory_store_busy waited_ms={}",
                        waited.as_millis()
                    );
                    return Err(E::from(TransactionError::Busy { waited }));
                };
                run_scope(&conn, scope_id, work)
            }
            (StoreTarget::File(path), None) => {
                let conn = open_db(path).map_err(|err| E::from(TransactionError::Db(err)))?;
                run_scope(&conn, scope_id, work)
            }
            (StoreTarget::SharedMemory(name), None) => {
                let conn = open_db_shared_memory(name)
                    .map_err(|err| E::from(TransactionError::Db(err)))?;
                run_scope(&conn, scope_id, work)
            }
        }
    }
}

/// Runs one outermost scope on `conn` and ends it exactly once.
fn run_scope<T, E, F>(conn: &Connection, scope_id: Uuid, work: F) -> Result<T, E>
where
    F: FnOnce(&UnitOfWork<'_>) -> Result<T, E>,
    E: From<TransactionError>,
{
    let started_at = Instant::now();
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(|err| E::from(TransactionError::from(err)))?;
    debug!("event=uow_begin module=tx status=start scope_id={scope_id}");

    let unit = UnitOfWork::new(&tx, scope_id);
    let outcome = work(&unit);
    let rollback_only = unit.is_rollback_only();
    drop(unit);

    match outcome {
        Ok(value) if !rollback_only => match tx.commit() {
            Ok(()) => {
                debug!(
                    "event=uow_commit module=tx status=ok scope_id={scope_id} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                error!("event=uow_commit module=tx status=error scope_id={scope_id} error={err}");
                Err(E::from(TransactionError::from(err)))
            }
        },
        Ok(_) => {
            roll_back(tx, scope_id, started_at);
            Err(E::from(TransactionError::RollbackOnly { scope_id }))
        }
        Err(err) => {
            roll_back(tx, scope_id, started_at);
            Err(err)
        }
    }
}

fn roll_back(tx: Transaction<'_>, scope_id: Uuid, started_at: Instant) {
    if tx.is_autocommit() {
        // SQLite already ended the transaction on its own.
        debug!("event=uow_rollback module=tx status=skipped scope_id={scope_id}");
        return;
    }

    match tx.rollback() {
        Ok(()) => info!(
            "event=uow_rollback module=tx status=ok scope_id={scope_id} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=uow_rollback module=tx status=error scope_id={scope_id} error={err}"
        ),
    }
}
