//! Flag storage backends.
//!
//! The evaluation path only ever reads; mutations are caller-driven. Any
//! persistence backend (in-memory, file, database, remote API) plugs in by
//! implementing [`FlagStore`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::error::{FlagError, FlagResult};
use crate::flag::FlagDefinition;

/// Store trait for flag definition backends.
///
/// The core requires no ordering, transactionality, or concurrency
/// guarantees; a production backend should still make `upsert_flag` an
/// atomic replacement so readers never observe a torn definition.
pub trait FlagStore: Send + Sync {
    /// Get the definition for `key`, if present.
    fn get_flag(&self, key: &str) -> Option<FlagDefinition>;

    /// Get a mutation-safe copy of every stored definition.
    fn all_flags(&self) -> HashMap<String, FlagDefinition>;

    /// Insert or fully replace the definition for `key`. No partial merge.
    fn upsert_flag(&self, key: &str, flag: FlagDefinition) -> FlagResult<()>;

    /// Delete the definition for `key`. Deleting an absent key is a no-op.
    fn delete_flag(&self, key: &str) -> FlagResult<()>;
}

/// In-memory flag store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    flags: RwLock<HashMap<String, FlagDefinition>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `flags`.
    pub fn with_flags(flags: HashMap<String, FlagDefinition>) -> Self {
        Self {
            flags: RwLock::new(flags),
        }
    }
}

impl FlagStore for InMemoryStore {
    fn get_flag(&self, key: &str) -> Option<FlagDefinition> {
        self.flags.read().get(key).cloned()
    }

    fn all_flags(&self) -> HashMap<String, FlagDefinition> {
        self.flags.read().clone()
    }

    fn upsert_flag(&self, key: &str, flag: FlagDefinition) -> FlagResult<()> {
        self.flags.write().insert(key.to_string(), flag);
        Ok(())
    }

    fn delete_flag(&self, key: &str) -> FlagResult<()> {
        self.flags.write().remove(key);
        Ok(())
    }
}

/// File-backed flag store.
///
/// Persists the whole flag mapping as one JSON object, rewritten wholesale on
/// every mutation and read once at construction. Missing or corrupt persisted
/// data loads as an empty mapping: a broken flag file degrades to "no flags",
/// it never takes the application down.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    flags: RwLock<HashMap<String, FlagDefinition>>,
}

impl FileStore {
    /// Open a file store at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FlagError::StoreUnavailable`] if the parent directory does
    /// not exist. Substrate problems surface here, at construction, never
    /// during evaluation.
    pub fn new(path: impl Into<PathBuf>) -> FlagResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.is_dir()
        {
            return Err(FlagError::StoreUnavailable(format!(
                "flag storage directory {} does not exist",
                parent.display()
            )));
        }

        let flags = Self::load(&path);
        info!(path = %path.display(), flags = flags.len(), "Opened file flag store");

        Ok(Self {
            path,
            flags: RwLock::new(flags),
        })
    }

    fn load(path: &Path) -> HashMap<String, FlagDefinition> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => {
                debug!(path = %path.display(), "No persisted flags, starting empty");
                return HashMap::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(flags) => flags,
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "Corrupt persisted flags, starting empty"
                );
                HashMap::new()
            }
        }
    }

    fn persist(&self, flags: &HashMap<String, FlagDefinition>) -> FlagResult<()> {
        let raw = serde_json::to_string(flags)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl FlagStore for FileStore {
    fn get_flag(&self, key: &str) -> Option<FlagDefinition> {
        self.flags.read().get(key).cloned()
    }

    fn all_flags(&self) -> HashMap<String, FlagDefinition> {
        self.flags.read().clone()
    }

    fn upsert_flag(&self, key: &str, flag: FlagDefinition) -> FlagResult<()> {
        let mut flags = self.flags.write();
        flags.insert(key.to_string(), flag);
        self.persist(&flags)
    }

    fn delete_flag(&self, key: &str) -> FlagResult<()> {
        let mut flags = self.flags.write();
        flags.remove(key);
        self.persist(&flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flag::Rollout;

    #[test]
    fn test_in_memory_upsert_get_delete() {
        let store = InMemoryStore::new();
        assert!(store.get_flag("checkout").is_none());

        store
            .upsert_flag("checkout", FlagDefinition::on())
            .unwrap();
        assert!(store.get_flag("checkout").unwrap().enabled);

        // Upsert replaces wholesale, no merge.
        store
            .upsert_flag(
                "checkout",
                FlagDefinition::off().with_description("paused"),
            )
            .unwrap();
        let replaced = store.get_flag("checkout").unwrap();
        assert!(!replaced.enabled);
        assert_eq!(replaced.description.as_deref(), Some("paused"));

        store.delete_flag("checkout").unwrap();
        assert!(store.get_flag("checkout").is_none());
        // Deleting again is a no-op.
        store.delete_flag("checkout").unwrap();
    }

    #[test]
    fn test_all_flags_returns_a_copy() {
        let store = InMemoryStore::new();
        store.upsert_flag("a", FlagDefinition::on()).unwrap();

        let mut copy = store.all_flags();
        copy.insert("b".to_string(), FlagDefinition::off());

        assert_eq!(store.all_flags().len(), 1);
    }

    #[test]
    fn test_with_flags_seeding() {
        let mut seed = HashMap::new();
        seed.insert("beta".to_string(), FlagDefinition::on());
        let store = InMemoryStore::with_flags(seed);
        assert!(store.get_flag("beta").unwrap().enabled);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.json");

        let store = FileStore::new(&path).unwrap();
        store
            .upsert_flag(
                "rollout",
                FlagDefinition::on().with_rollout(Rollout::new(25.0)),
            )
            .unwrap();
        drop(store);

        let reopened = FileStore::new(&path).unwrap();
        let flag = reopened.get_flag("rollout").unwrap();
        assert_eq!(flag.rollout.unwrap().percentage, 25.0);

        reopened.delete_flag("rollout").unwrap();
        drop(reopened);

        let emptied = FileStore::new(&path).unwrap();
        assert!(emptied.get_flag("rollout").is_none());
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json")).unwrap();
        assert!(store.all_flags().is_empty());
    }

    #[test]
    fn test_file_store_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileStore::new(&path).unwrap();
        assert!(store.all_flags().is_empty());

        // Fail open, not fatal: the store keeps working and overwrites the
        // corrupt payload on the next mutation.
        store.upsert_flag("fresh", FlagDefinition::on()).unwrap();
        let reopened = FileStore::new(&path).unwrap();
        assert!(reopened.get_flag("fresh").unwrap().enabled);
    }

    #[test]
    fn test_file_store_missing_directory_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileStore::new(dir.path().join("no-such-dir").join("flags.json"));
        assert!(matches!(result, Err(FlagError::StoreUnavailable(_))));
    }
}
