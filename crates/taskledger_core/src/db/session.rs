//! Units of work over an injected SQLite connection.
//!
//! # Responsibility
//! - Open one transaction per repository call.
//! - Guarantee release on every exit path: a session that is neither
//!   committed nor rolled back is rolled back on drop.
//!
//! # Invariants
//! - Sessions are never cached or shared; each `acquire_session` call yields
//!   a fresh transaction on the same connection.
//! - Only one session may be live per connection at a time.

use super::{DbError, DbResult};
use log::{debug, warn};
use rusqlite::{Connection, Transaction};
use std::time::Instant;

/// Stateless factory handing out sessions bound to one connection.
#[derive(Debug, Clone, Copy)]
pub struct SessionFactory<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SessionFactory<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Begins a new deferred transaction on the bound connection.
    pub fn acquire_session(&self) -> DbResult<Session<'conn>> {
        let tx = self.conn.unchecked_transaction()?;
        Ok(Session {
            tx,
            started_at: Instant::now(),
        })
    }

    /// Runs `work` inside a fresh session.
    ///
    /// Commits when `work` succeeds. When it fails the session is rolled back
    /// and the original error is returned unchanged; a rollback failure is
    /// only logged.
    pub fn run<T, E>(
        &self,
        operation: &'static str,
        work: impl FnOnce(&Session<'conn>) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let session = self.acquire_session()?;
        match work(&session) {
            Ok(value) => {
                session.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = session.rollback() {
                    warn!(
                        "event=session_rollback module=db status=error op={} error={}",
                        operation, rollback_err
                    );
                }
                Err(err)
            }
        }
    }
}

/// Scoped unit of work. Rolls back on drop unless committed.
pub struct Session<'conn> {
    tx: Transaction<'conn>,
    started_at: Instant,
}

impl Session<'_> {
    /// Connection view used to issue statements inside this unit of work.
    pub fn conn(&self) -> &Connection {
        &self.tx
    }

    pub fn commit(self) -> DbResult<()> {
        let elapsed = self.started_at.elapsed();
        self.tx.commit()?;
        debug!(
            "event=session_commit module=db status=ok duration_ms={}",
            elapsed.as_millis()
        );
        Ok(())
    }

    pub fn rollback(self) -> DbResult<()> {
        let elapsed = self.started_at.elapsed();
        self.tx.rollback()?;
        debug!(
            "event=session_rollback module=db status=ok duration_ms={}",
            elapsed.as_millis()
        );
        Ok(())
    }
}
