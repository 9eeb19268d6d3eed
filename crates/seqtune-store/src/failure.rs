//! The failure database: a persistent set of `(sequence, failure key)`.
//!
//! Membership checks hit an in-memory index only; the sqlite backing is
//! written through on `record_bad` and read once at `open` to hydrate the
//! index. A sequence is bad *under a key*, never globally: the same ids may
//! be hopeless for natural text at length 3 and untested everywhere else.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use parking_lot::Mutex;
use rusqlite::Connection;
use seqtune_error::{Result, TuneError};
use seqtune_types::FailureKey;
use tracing::{debug, info};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS BTRFailSequences (\
                      Sequence BLOB NOT NULL, \
                      FailureKey TEXT NOT NULL, \
                      PRIMARY KEY (Sequence, FailureKey))";

#[derive(Default)]
struct Inner {
    /// `base64(sequence)` → keys it is bad under.
    index: HashMap<String, HashSet<String>>,
    /// Encoded key → distinct bad sequences under it.
    key_counts: HashMap<String, usize>,
    conn: Option<Connection>,
    /// Rows are appended only when the store was opened with
    /// `create_if_missing`.
    persist: bool,
    path: Option<PathBuf>,
    open: bool,
}

/// Thread-safe failure store. All operations serialize on one lock.
#[derive(Default)]
pub struct FailureStore {
    inner: Mutex<Inner>,
}

impl FailureStore {
    /// A closed store; every query fails until [`FailureStore::open`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or create) the backing file and hydrate the index.
    ///
    /// Reopening with a different path clears the index and rebinds; the
    /// operation is idempotent for the same path within a process.
    pub fn open(&self, path: &Path, create_if_missing: bool) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.open && inner.path.as_deref() == Some(path) {
            return Ok(());
        }
        *inner = Inner::default();

        let exists = path.exists();
        if !exists && !create_if_missing {
            // No backing and not allowed to create one: run with the index
            // only.
            inner.open = true;
            inner.path = Some(path.to_owned());
            return Ok(());
        }

        let conn = Connection::open(path).map_err(TuneError::store)?;
        conn.execute(SCHEMA, []).map_err(TuneError::store)?;
        if exists {
            hydrate(&conn, &mut inner)?;
        }
        info!(
            target: "seqtune.failstore",
            path = %path.display(),
            sequences = inner.index.len(),
            "failure store open"
        );
        inner.conn = Some(conn);
        inner.persist = create_if_missing;
        inner.path = Some(path.to_owned());
        inner.open = true;
        Ok(())
    }

    /// Open with no backing at all; the index lives and dies with the
    /// process. Used by runs that do not record failures persistently.
    pub fn open_in_memory(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        *inner = Inner::default();
        inner.open = true;
        Ok(())
    }

    /// Constant-time membership check against the index.
    pub fn is_bad(&self, sequence: &[u8], key: &FailureKey) -> Result<bool> {
        let inner = self.inner.lock();
        if !inner.open {
            return Err(TuneError::StoreClosed);
        }
        Ok(inner
            .index
            .get(&BASE64.encode(sequence))
            .is_some_and(|keys| keys.contains(&key.encode())))
    }

    /// Record a sequence as bad under the key. Never double-counts; the
    /// backing row is appended only when the store may persist.
    pub fn record_bad(&self, sequence: &[u8], key: &FailureKey) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.open {
            return Err(TuneError::StoreClosed);
        }
        let encoded_key = key.encode();
        let newly_indexed = inner
            .index
            .entry(BASE64.encode(sequence))
            .or_default()
            .insert(encoded_key.clone());
        if !newly_indexed {
            return Ok(());
        }
        *inner.key_counts.entry(encoded_key.clone()).or_insert(0) += 1;

        if inner.persist {
            if let Some(conn) = &inner.conn {
                conn.execute(
                    "INSERT OR IGNORE INTO BTRFailSequences (Sequence, FailureKey) VALUES (?1, ?2)",
                    rusqlite::params![sequence, encoded_key],
                )
                .map_err(TuneError::store)?;
            }
        }
        debug!(target: "seqtune.failstore", key = %encoded_key, "recorded bad sequence");
        Ok(())
    }

    /// Distinct bad sequences recorded under the key.
    pub fn count(&self, key: &FailureKey) -> Result<usize> {
        let inner = self.inner.lock();
        if !inner.open {
            return Err(TuneError::StoreClosed);
        }
        Ok(inner.key_counts.get(&key.encode()).copied().unwrap_or(0))
    }

    /// Forget every sequence recorded under one key, in the index and the
    /// backing. Maintenance hook for when a context's thresholds change
    /// and its old verdicts no longer apply. Returns how many rows fell.
    pub fn forget(&self, key: &FailureKey) -> Result<usize> {
        let mut inner = self.inner.lock();
        if !inner.open {
            return Err(TuneError::StoreClosed);
        }
        let encoded_key = key.encode();
        let mut removed = 0;
        for keys in inner.index.values_mut() {
            if keys.remove(&encoded_key) {
                removed += 1;
            }
        }
        inner.index.retain(|_, keys| !keys.is_empty());
        inner.key_counts.remove(&encoded_key);

        if inner.persist {
            if let Some(conn) = &inner.conn {
                conn.execute(
                    "DELETE FROM BTRFailSequences WHERE FailureKey = ?1",
                    rusqlite::params![encoded_key],
                )
                .map_err(TuneError::store)?;
            }
        }
        Ok(removed)
    }

    /// Drop the backing connection and clear the index.
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        *inner = Inner::default();
        Ok(())
    }
}

fn hydrate(conn: &Connection, inner: &mut Inner) -> Result<()> {
    let mut stmt = conn
        .prepare("SELECT Sequence, FailureKey FROM BTRFailSequences")
        .map_err(TuneError::store)?;
    let rows = stmt
        .query_map([], |row| {
            let sequence: Vec<u8> = row.get(0)?;
            let key: String = row.get(1)?;
            Ok((sequence, key))
        })
        .map_err(TuneError::store)?;
    for row in rows {
        let (sequence, key) = row.map_err(TuneError::store)?;
        let newly = inner
            .index
            .entry(BASE64.encode(&sequence))
            .or_default()
            .insert(key.clone());
        if newly {
            *inner.key_counts.entry(key).or_insert(0) += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use seqtune_types::DataType;

    use super::*;

    fn key(length: u32) -> FailureKey {
        FailureKey::munge(None, DataType::Random, 6, length, 9)
    }

    #[test]
    fn queries_fail_before_open() {
        let store = FailureStore::new();
        assert!(matches!(
            store.is_bad(&[1], &key(1)),
            Err(TuneError::StoreClosed)
        ));
        assert!(matches!(
            store.record_bad(&[1], &key(1)),
            Err(TuneError::StoreClosed)
        ));
    }

    #[test]
    fn record_then_query_round_trips() {
        let store = FailureStore::new();
        store.open_in_memory().unwrap();
        assert!(!store.is_bad(&[10, 11], &key(2)).unwrap());
        store.record_bad(&[10, 11], &key(2)).unwrap();
        assert!(store.is_bad(&[10, 11], &key(2)).unwrap());
        // Same sequence, different key: unseen.
        assert!(!store.is_bad(&[10, 11], &key(3)).unwrap());
    }

    #[test]
    fn double_record_never_double_counts() {
        let store = FailureStore::new();
        store.open_in_memory().unwrap();
        store.record_bad(&[5], &key(1)).unwrap();
        store.record_bad(&[5], &key(1)).unwrap();
        assert_eq!(store.count(&key(1)).unwrap(), 1);
    }

    #[test]
    fn rows_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fails.db");

        let store = FailureStore::new();
        store.open(&path, true).unwrap();
        store.record_bad(&[10, 11], &key(2)).unwrap();
        store.record_bad(&[11, 10], &key(2)).unwrap();
        store.close().unwrap();

        let fresh = FailureStore::new();
        fresh.open(&path, true).unwrap();
        assert!(fresh.is_bad(&[10, 11], &key(2)).unwrap());
        assert!(fresh.is_bad(&[11, 10], &key(2)).unwrap());
        assert_eq!(fresh.count(&key(2)).unwrap(), 2);
    }

    #[test]
    fn reopen_with_a_different_path_rebinds() {
        let dir = tempfile::tempdir().unwrap();
        let store = FailureStore::new();
        store.open(&dir.path().join("a.db"), true).unwrap();
        store.record_bad(&[1], &key(1)).unwrap();

        store.open(&dir.path().join("b.db"), true).unwrap();
        assert!(!store.is_bad(&[1], &key(1)).unwrap());
    }

    #[test]
    fn forget_clears_one_key_and_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fails.db");
        let store = FailureStore::new();
        store.open(&path, true).unwrap();
        store.record_bad(&[1], &key(2)).unwrap();
        store.record_bad(&[2], &key(2)).unwrap();
        store.record_bad(&[1], &key(3)).unwrap();

        assert_eq!(store.forget(&key(2)).unwrap(), 2);
        assert!(!store.is_bad(&[1], &key(2)).unwrap());
        assert_eq!(store.count(&key(2)).unwrap(), 0);
        // The other key's record is untouched.
        assert!(store.is_bad(&[1], &key(3)).unwrap());
        store.close().unwrap();

        let fresh = FailureStore::new();
        fresh.open(&path, true).unwrap();
        assert!(!fresh.is_bad(&[1], &key(2)).unwrap());
        assert!(fresh.is_bad(&[1], &key(3)).unwrap());
    }

    #[test]
    fn missing_file_without_create_runs_index_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let store = FailureStore::new();
        store.open(&path, false).unwrap();
        store.record_bad(&[7], &key(1)).unwrap();
        assert!(store.is_bad(&[7], &key(1)).unwrap());
        // Nothing was created on disk.
        assert!(!path.exists());
    }
}
