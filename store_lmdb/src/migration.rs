//! Database schema migration engine.
//!
//! Tracks a monotonically increasing schema version under the metadata
//! prefix and runs sequential migration functions to bring an older database
//! up to date.

use proxyvote_store::keys::meta_key;
use proxyvote_store::KvStore;

use crate::LmdbError;

/// The schema version that the current code expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const SCHEMA_VERSION: &str = "schema_version";

/// Runs database migrations to bring the schema up to date.
pub struct Migrator;

impl Migrator {
    /// Check the stored schema version and run any needed migrations.
    ///
    /// - Version 0 means a fresh database (no version stored yet).
    /// - If the stored version matches `CURRENT_SCHEMA_VERSION`, this is a no-op.
    /// - If the stored version is *higher* than what this code supports,
    ///   the database was written by a newer build and we refuse to open it.
    pub fn run(store: &impl KvStore) -> Result<(), LmdbError> {
        let current = schema_version(store)?;

        if current == CURRENT_SCHEMA_VERSION {
            tracing::debug!(version = current, "database schema is up to date");
            return Ok(());
        }

        if current > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::Heed(format!(
                "database schema version {} is newer than supported version {}",
                current, CURRENT_SCHEMA_VERSION
            )));
        }

        for version in current..CURRENT_SCHEMA_VERSION {
            tracing::info!(from = version, to = version + 1, "running migration");
            run_migration(version, version + 1)?;
        }

        store
            .put(&meta_key(SCHEMA_VERSION), &CURRENT_SCHEMA_VERSION.to_le_bytes())
            .map_err(|e| LmdbError::Heed(e.to_string()))?;
        tracing::info!(version = CURRENT_SCHEMA_VERSION, "migration complete");
        Ok(())
    }
}

/// Read the stored schema version (0 when absent).
pub fn schema_version(store: &impl KvStore) -> Result<u32, LmdbError> {
    let stored = store
        .get(&meta_key(SCHEMA_VERSION))
        .map_err(|e| LmdbError::Heed(e.to_string()))?;
    match stored {
        None => Ok(0),
        Some(bytes) => {
            let arr: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                LmdbError::Schema("schema_version has unexpected byte length".to_string())
            })?;
            Ok(u32::from_le_bytes(arr))
        }
    }
}

fn run_migration(from: u32, to: u32) -> Result<(), LmdbError> {
    match (from, to) {
        // 0 → 1: fresh database, the keyspace starts empty.
        (0, 1) => Ok(()),
        _ => Err(LmdbError::Heed(format!(
            "no migration path from schema {from} to {to}"
        ))),
    }
}
