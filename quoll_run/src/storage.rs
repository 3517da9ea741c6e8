//! Save-file storage: a key-value blob store keyed by `(gameId, fileName)`.
//!
//! Blobs are lists of Integers packed little-endian, four bytes each. The
//! trait stands in for whatever database the host wires up; the in-memory
//! backend keeps tests deterministic and the JSON backend persists to a
//! single file on disk.

use quoll_common::{TypeTag, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Directory entry returned by [`FileStore::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub last_modified: u64,
}

pub trait FileStore {
    fn list(&self, game_id: &str) -> Vec<FileRecord>;
    fn read(&self, game_id: &str, name: &str) -> Option<Vec<u8>>;
    fn write(&mut self, game_id: &str, name: &str, blob: &[u8]) -> bool;
    fn delete(&mut self, game_id: &str, name: &str) -> bool;
}

/// Pack a list of Integer values into the blob format. Returns None when
/// any item is not an Integer.
pub fn pack_values(items: &[Value]) -> Option<Vec<u8>> {
    let mut blob = Vec::with_capacity(items.len() * 4);
    for item in items {
        if item.tag != TypeTag::Integer {
            return None;
        }
        blob.extend_from_slice(&item.payload.to_le_bytes());
    }
    Some(blob)
}

/// Unpack a blob into Integer values; a trailing partial word is dropped.
pub fn unpack_blob(blob: &[u8]) -> Vec<Value> {
    blob.chunks_exact(4)
        .map(|word| Value::integer(i32::from_le_bytes([word[0], word[1], word[2], word[3]])))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredFile {
    last_modified: u64,
    data: Vec<u8>,
}

/// In-memory store with a deterministic logical clock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: HashMap<(String, String), StoredFile>,
    clock: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl FileStore for MemoryStore {
    fn list(&self, game_id: &str) -> Vec<FileRecord> {
        let mut records: Vec<FileRecord> = self
            .files
            .iter()
            .filter(|((game, _), _)| game == game_id)
            .map(|((_, name), file)| FileRecord {
                name: name.clone(),
                last_modified: file.last_modified,
            })
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }

    fn read(&self, game_id: &str, name: &str) -> Option<Vec<u8>> {
        self.files
            .get(&(game_id.to_string(), name.to_string()))
            .map(|file| file.data.clone())
    }

    fn write(&mut self, game_id: &str, name: &str, blob: &[u8]) -> bool {
        self.clock += 1;
        self.files.insert(
            (game_id.to_string(), name.to_string()),
            StoredFile {
                last_modified: self.clock,
                data: blob.to_vec(),
            },
        );
        true
    }

    fn delete(&mut self, game_id: &str, name: &str) -> bool {
        self.files
            .remove(&(game_id.to_string(), name.to_string()))
            .is_some()
    }
}

/// Store persisted as a single JSON document on disk.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    games: HashMap<String, HashMap<String, StoredFile>>,
}

impl JsonStore {
    /// Open the store, loading any existing document. A missing or
    /// unreadable file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let games = std::fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        JsonStore { path, games }
    }

    fn persist(&self) {
        match serde_json::to_string_pretty(&self.games) {
            Ok(text) => {
                if let Err(err) = std::fs::write(&self.path, text) {
                    log::warn!("could not persist save files to {:?}: {}", self.path, err);
                }
            }
            Err(err) => log::warn!("could not serialize save files: {}", err),
        }
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

impl FileStore for JsonStore {
    fn list(&self, game_id: &str) -> Vec<FileRecord> {
        let mut records: Vec<FileRecord> = self
            .games
            .get(game_id)
            .into_iter()
            .flatten()
            .map(|(name, file)| FileRecord {
                name: name.clone(),
                last_modified: file.last_modified,
            })
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }

    fn read(&self, game_id: &str, name: &str) -> Option<Vec<u8>> {
        self.games
            .get(game_id)
            .and_then(|files| files.get(name))
            .map(|file| file.data.clone())
    }

    fn write(&mut self, game_id: &str, name: &str, blob: &[u8]) -> bool {
        self.games.entry(game_id.to_string()).or_default().insert(
            name.to_string(),
            StoredFile {
                last_modified: Self::now(),
                data: blob.to_vec(),
            },
        );
        self.persist();
        true
    }

    fn delete(&mut self, game_id: &str, name: &str) -> bool {
        let removed = self
            .games
            .get_mut(game_id)
            .map(|files| files.remove(name).is_some())
            .unwrap_or(false);
        if removed {
            self.persist();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_packing_round_trips() {
        let values = vec![Value::integer(1), Value::integer(-1), Value::integer(1000)];
        let blob = pack_values(&values).unwrap();
        assert_eq!(blob.len(), 12);
        assert_eq!(unpack_blob(&blob), values);
    }

    #[test]
    fn non_integers_refuse_to_pack() {
        let values = vec![Value::integer(1), Value::new(TypeTag::String, 2)];
        assert!(pack_values(&values).is_none());
    }

    #[test]
    fn memory_store_lists_per_game() {
        let mut store = MemoryStore::new();
        store.write("GAME-A", "slot1", &[1, 0, 0, 0]);
        store.write("GAME-A", "slot2", &[2, 0, 0, 0]);
        store.write("GAME-B", "other", &[3, 0, 0, 0]);
        let names: Vec<String> = store
            .list("GAME-A")
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["slot1", "slot2"]);
        assert_eq!(store.read("GAME-A", "slot1"), Some(vec![1, 0, 0, 0]));
        assert!(store.delete("GAME-A", "slot1"));
        assert!(!store.delete("GAME-A", "slot1"));
        assert_eq!(store.read("GAME-A", "slot1"), None);
    }

    #[test]
    fn overwriting_bumps_the_clock() {
        let mut store = MemoryStore::new();
        store.write("G", "slot", &[1, 0, 0, 0]);
        let first = store.list("G")[0].last_modified;
        store.write("G", "slot", &[2, 0, 0, 0]);
        let second = store.list("G")[0].last_modified;
        assert!(second > first);
    }
}
