//! Blog schema upgrades keyed by `PRAGMA user_version`.
//!
//! Steps run in one transaction, oldest first, and each bumps the version.
//! After any upgrade (or none) the `ranks` table must hold one row per
//! [`Role`], since user provisioning resolves ranks by name.

use crate::model::user::Role;
use crate::store::{StoreError, StoreResult};
use log::{info, warn};
use rusqlite::{Connection, OptionalExtension};

/// `(resulting user_version, script)`, in apply order.
const SCHEMA_STEPS: &[(u32, &str)] = &[
    (1, include_str!("0001_init.sql")),
    (2, include_str!("0002_unique_tag_names.sql")),
];

pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |(version, _)| *version)
}

/// Brings `conn` up to [`latest_version`] and checks the rank seed.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file is newer than this build.
/// - `MissingSeed` when a rank row was deleted out from under us.
pub fn apply_migrations(conn: &mut Connection) -> StoreResult<()> {
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let supported = latest_version();
    if found > supported {
        return Err(StoreError::UnsupportedSchemaVersion { found, supported });
    }

    if found < supported {
        let tx = conn.transaction()?;
        for (version, script) in SCHEMA_STEPS.iter().skip_while(|(v, _)| *v <= found) {
            tx.execute_batch(script)?;
            tx.pragma_update(None, "user_version", version)?;
        }
        tx.commit()?;
        info!(
            "event=db_migrate module=db status=ok from_version={} to_version={}",
            found, supported
        );
    }

    verify_rank_seed(conn)
}

fn verify_rank_seed(conn: &Connection) -> StoreResult<()> {
    let mut lookup = conn.prepare("SELECT id FROM ranks WHERE role_name = ?1;")?;
    for role in Role::ALL {
        let rank: Option<i64> = lookup
            .query_row([role.rank_name()], |row| row.get(0))
            .optional()?;
        if rank.is_none() {
            warn!(
                "event=db_migrate module=db status=error error_code=rank_seed_missing rank={}",
                role.rank_name()
            );
            return Err(StoreError::MissingSeed(format!(
                "rank `{}`",
                role.rank_name()
            )));
        }
    }
    Ok(())
}
