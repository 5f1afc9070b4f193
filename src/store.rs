//! Record store adapter.
//!
//! The ledger itself is an external collaborator; the core only needs `get`
//! and `put` of opaque bytes by key plus an all-or-nothing `commit`. Requests
//! never write to the ledger directly: they stage writes in a [`WriteSet`]
//! and the dispatcher commits the set once the request has succeeded.

use crate::error::{LoyaltyError, Result};
use log::debug;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

/// Key-value access to the durable ledger.
pub trait RecordStore {
    /// Returns the value stored under `key`, or `None` if nothing is.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Applies a request's staged writes: every key lands, or on error none
    /// of them does.
    fn commit(&mut self, writes: Vec<(String, Vec<u8>)>) -> Result<()>;
}

/// In-process ledger backed by an ordered map.
///
/// Serves the CLI and tests. Its contents can be saved to and loaded from a
/// JSON snapshot that maps each key to its (UTF-8) value.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        MemoryStore {
            entries: BTreeMap::new(),
        }
    }

    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no key is held.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loads a snapshot written by [`MemoryStore::save`]. A missing file
    /// yields an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No snapshot at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot: BTreeMap<String, String> = serde_json::from_reader(BufReader::new(file))?;
        let entries = snapshot
            .into_iter()
            .map(|(key, value)| (key, value.into_bytes()))
            .collect::<BTreeMap<_, _>>();

        debug!("Loaded {} keys from {}", entries.len(), path.display());
        Ok(MemoryStore { entries })
    }

    /// Writes every key to a JSON snapshot at `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let snapshot: BTreeMap<&str, String> = self
            .entries
            .iter()
            .map(|(key, value)| (key.as_str(), String::from_utf8_lossy(value).into_owned()))
            .collect();

        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &snapshot)?;
        writer.flush()?;

        debug!("Saved {} keys to {}", snapshot.len(), path.display());
        Ok(())
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn commit(&mut self, writes: Vec<(String, Vec<u8>)>) -> Result<()> {
        self.entries.extend(writes);
        Ok(())
    }
}

/// Writes staged on top of a read-only view of a store.
///
/// Reads see the staged writes first, then the base store. Nothing reaches
/// the base store until [`WriteSet::into_writes`] is handed to its `commit`;
/// dropping the set discards the writes.
#[derive(Debug)]
pub struct WriteSet<'a, S: ?Sized> {
    base: &'a S,
    writes: BTreeMap<String, Vec<u8>>,
}

impl<'a, S: RecordStore + ?Sized> WriteSet<'a, S> {
    /// Starts an empty write set over `base`.
    pub fn new(base: &'a S) -> Self {
        WriteSet {
            base,
            writes: BTreeMap::new(),
        }
    }

    /// Number of staged keys.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Returns `true` if nothing has been staged.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Consumes the set, returning the staged writes in key order.
    pub fn into_writes(self) -> Vec<(String, Vec<u8>)> {
        self.writes.into_iter().collect()
    }
}

impl<S: RecordStore + ?Sized> RecordStore for WriteSet<'_, S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.writes.get(key) {
            Some(value) => Ok(Some(value.clone())),
            None => self.base.get(key),
        }
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        self.writes.insert(key.to_string(), value);
        Ok(())
    }

    fn commit(&mut self, writes: Vec<(String, Vec<u8>)>) -> Result<()> {
        self.writes.extend(writes);
        Ok(())
    }
}

/// Maps a backend failure to [`LoyaltyError::StoreUnavailable`].
pub fn unavailable(reason: impl ToString) -> LoyaltyError {
    LoyaltyError::StoreUnavailable(reason.to_string())
}
