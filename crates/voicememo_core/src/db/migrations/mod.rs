//! Schema migrations for the note store.
//!
//! # Responsibility
//! - Register the notebook schema steps in strictly increasing order.
//! - Apply pending steps in one transaction and report which step failed.
//! - Check the fallback project seed before repositories touch the store.
//!
//! # Invariants
//! - Applied version is mirrored to `PRAGMA user_version`.
//! - A failed step leaves the database at its previous version.

use crate::db::{DbError, DbResult};
use crate::model::project::FALLBACK_PROJECT_ID;
use log::{error, info};
use rusqlite::{Connection, OptionalExtension};

/// One ordered schema step.
#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "0001_init",
        sql: include_str!("0001_init.sql"),
    },
    SchemaStep {
        version: 2,
        name: "0002_task_suggestions",
        sql: include_str!("0002_task_suggestions.sql"),
    },
];

/// Schema version this build writes and understands.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Reads the schema version recorded in `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

/// Brings `conn` to [`latest_version`] and checks the fallback project seed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version = schema_version(conn)?;
    let latest = latest_version();

    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    if from_version < latest {
        info!(
            "event=db_migrate module=db status=start from_version={} to_version={}",
            from_version, latest
        );
        let tx = conn.transaction()?;
        for step in SCHEMA_STEPS.iter().filter(|step| step.version > from_version) {
            tx.execute_batch(step.sql)
                .and_then(|()| {
                    tx.execute_batch(&format!("PRAGMA user_version = {};", step.version))
                })
                .map_err(|source| {
                    error!(
                        "event=db_migrate module=db status=error version={} step={}",
                        step.version, step.name
                    );
                    DbError::MigrationFailed {
                        version: step.version,
                        name: step.name,
                        source,
                    }
                })?;
        }
        tx.commit()?;
        info!(
            "event=db_migrate module=db status=ok to_version={}",
            latest
        );
    }

    ensure_fallback_project(conn)
}

fn ensure_fallback_project(conn: &Connection) -> DbResult<()> {
    let active = conn
        .query_row(
            "SELECT is_active FROM projects WHERE id = ?1;",
            [FALLBACK_PROJECT_ID.to_string()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;

    match active {
        Some(1) => Ok(()),
        _ => Err(DbError::FallbackProjectMissing),
    }
}
