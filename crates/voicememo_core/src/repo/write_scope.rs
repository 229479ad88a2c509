//! Groups writes from several repositories into one SQLite transaction.
//!
//! Repositories built on the same connection share its transaction, so work
//! run inside [`WriteScope::atomically`] commits or rolls back as a unit.

use super::RepoError;
use log::warn;
use rusqlite::Connection;

pub trait WriteScope {
    /// Runs `work` in one transaction; an `Err` from `work` rolls it back.
    fn atomically<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<RepoError>;
}

pub struct SqliteWriteScope<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteWriteScope<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl WriteScope for SqliteWriteScope<'_> {
    fn atomically<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<RepoError>,
    {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|err| E::from(RepoError::from(err)))?;
        match work() {
            Ok(value) => {
                tx.commit().map_err(|err| E::from(RepoError::from(err)))?;
                Ok(value)
            }
            Err(err) => {
                warn!("event=write_scope module=repo status=rollback");
                Err(err)
            }
        }
    }
}

