//! Ordered schema migrations.
//!
//! Each script brings the schema from `version - 1` to `version`. Pending
//! scripts run inside one immediate transaction, so concurrent openers of a
//! fresh file wait for the first one instead of racing it.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::{Connection, TransactionBehavior};

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "users_profiles",
        sql: include_str!("0001_users_profiles.sql"),
    },
    Migration {
        version: 2,
        name: "lessons",
        sql: include_str!("0002_lessons.sql"),
    },
    Migration {
        version: 3,
        name: "forum",
        sql: include_str!("0003_forum.sql"),
    },
    Migration {
        version: 4,
        name: "blog_practice",
        sql: include_str!("0004_blog_practice.sql"),
    },
    Migration {
        version: 5,
        name: "notifications",
        sql: include_str!("0005_notifications.sql"),
    },
];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Brings `conn` to [`latest_version`]. Newer files are refused untouched.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let latest = latest_version();
    if schema_version(conn)? == latest {
        return Ok(());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    // Re-read under the write lock; another connection may have migrated.
    let from_version = schema_version(&tx)?;
    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > from_version) {
        tx.execute_batch(migration.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", migration.version))
            .map_err(|source| DbError::Migration {
                version: migration.version,
                name: migration.name,
                source,
            })?;
        debug!(
            "event=db_migration_step module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;

    if from_version < latest {
        info!(
            "event=db_migrate module=db status=ok from_version={} to_version={}",
            from_version, latest
        );
    }
    Ok(())
}
