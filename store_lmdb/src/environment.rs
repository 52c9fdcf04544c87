//! LMDB environment setup.

use std::path::{Path, PathBuf};

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::kv::LmdbKvStore;
use crate::migration::Migrator;
use crate::LmdbError;

/// Name of the single database holding the governance keyspace.
const GOVERNANCE_DB: &str = "governance";

/// Wraps the LMDB environment and its database handle.
pub struct LmdbEnvironment {
    env: Env,
    db: Database<Bytes, Bytes>,
    path: PathBuf,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path and bring its
    /// schema up to date.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the environment is opened once per path by this process and
        // never concurrently truncated or remapped by another handle.
        let env = unsafe { EnvOpenOptions::new().map_size(map_size).max_dbs(4).open(path)? };

        let mut wtxn = env.write_txn()?;
        let db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(GOVERNANCE_DB))?;
        wtxn.commit()?;

        let environment = Self {
            env,
            db,
            path: path.to_path_buf(),
        };
        Migrator::run(&environment.kv_store())?;
        tracing::info!(path = %environment.path.display(), "opened LMDB environment");
        Ok(environment)
    }

    /// A [`proxyvote_store::KvStore`] handle over the governance database.
    pub fn kv_store(&self) -> LmdbKvStore {
        LmdbKvStore {
            env: self.env.clone(),
            db: self.db,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
