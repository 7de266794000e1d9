//! Schema migrations for the local slot database.
//!
//! # Invariants
//! - Versions start at 1 and increase by exactly one per entry.
//! - All pending steps run in one transaction; `user_version` moves with them.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, Transaction};

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "kv_store",
    sql: include_str!("0001_kv_store.sql"),
}];

/// Latest schema version this build can read and write.
pub fn latest_version() -> u32 {
    MIGRATIONS.len() as u32
}

/// Reads the schema version stored in the database header.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}

/// Brings the schema up to `latest_version()`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file is newer than this build.
/// - `Migration` when a step fails; earlier steps of the same run are rolled back.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from = schema_version(conn)?;
    let latest = latest_version();
    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }

    let pending = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > from)
        .collect::<Vec<_>>();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in pending {
        run_step(&tx, migration)?;
    }
    tx.commit()?;
    info!("event=db_migrate module=db status=ok from={from} to={latest}");
    Ok(())
}

fn run_step(tx: &Transaction<'_>, migration: &Migration) -> DbResult<()> {
    let wrap = |source| DbError::Migration {
        version: migration.version,
        source,
    };
    tx.execute_batch(migration.sql).map_err(wrap)?;
    tx.pragma_update(None, "user_version", migration.version)
        .map_err(wrap)?;
    info!(
        "event=db_migration_step module=db status=ok version={} name={}",
        migration.version, migration.name
    );
    Ok(())
}
