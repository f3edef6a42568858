//! Key-value persistence. The platform hands us a small store of fixed keys,
//! each holding an opaque byte blob.

use crate::record::PersistKey;
use log::{debug, error, info};
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fs,
    io,
    path::{Path, PathBuf},
    rc::Rc,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error")]
    Io(#[from] io::Error),

    #[error("Error (de)serializing storage file")]
    Json(#[from] serde_json::Error),

    #[error("Write to key {0} rejected")]
    WriteRejected(PersistKey),
}

/// Persistent key-value storage
pub trait Storage {
    fn exists(&self, key: PersistKey) -> bool;

    /// Copy the value for `key` into `buf`, returning how many bytes were
    /// copied. Reading a missing key copies nothing.
    fn read(
        &self,
        key: PersistKey,
        buf: &mut [u8],
    ) -> Result<usize, StorageError>;

    /// Overwrite the value for `key`
    fn write(
        &mut self,
        key: PersistKey,
        data: &[u8],
    ) -> Result<(), StorageError>;
}

/// In-memory storage. Clones share the same underlying map, so a caller can
/// keep a handle and inspect what the store wrote.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    values: Rc<RefCell<HashMap<PersistKey, Vec<u8>>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of the raw bytes under a key
    pub fn get(&self, key: PersistKey) -> Option<Vec<u8>> {
        self.values.borrow().get(&key).cloned()
    }

    /// Insert raw bytes, bypassing [Storage::write]
    pub fn insert(&self, key: PersistKey, data: impl Into<Vec<u8>>) {
        self.values.borrow_mut().insert(key, data.into());
    }

    /// Make every subsequent write fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl Storage for MemoryStorage {
    fn exists(&self, key: PersistKey) -> bool {
        self.values.borrow().contains_key(&key)
    }

    fn read(
        &self,
        key: PersistKey,
        buf: &mut [u8],
    ) -> Result<usize, StorageError> {
        Ok(copy_into(self.values.borrow().get(&key), buf))
    }

    fn write(
        &mut self,
        key: PersistKey,
        data: &[u8],
    ) -> Result<(), StorageError> {
        if self.fail_writes.get() {
            return Err(StorageError::WriteRejected(key));
        }
        self.values.borrow_mut().insert(key, data.to_vec());
        Ok(())
    }
}

/// Storage backed by a JSON file, mapping key to byte array. The whole file
/// is rewritten on every write, via a temp file that gets renamed into place.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: HashMap<u32, Vec<u8>>,
}

impl FileStorage {
    /// Open the storage file. A missing or unreadable file starts empty, so
    /// every record falls back to unknown values.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_owned();
        let values = match fs::read(&path) {
            Ok(contents) => match serde_json::from_slice(&contents) {
                Ok(values) => values,
                Err(err) => {
                    error!(
                        "Error parsing storage file {}, starting empty: {err}",
                        path.display()
                    );
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("No storage file at {}, starting empty", path.display());
                HashMap::new()
            }
            Err(err) => return Err(err.into()),
        };
        debug!("Opened storage {} with {} keys", path.display(), values.len());
        Ok(Self { path, values })
    }
}

impl Storage for FileStorage {
    fn exists(&self, key: PersistKey) -> bool {
        self.values.contains_key(&key.0)
    }

    fn read(
        &self,
        key: PersistKey,
        buf: &mut [u8],
    ) -> Result<usize, StorageError> {
        Ok(copy_into(self.values.get(&key.0), buf))
    }

    /// The in-memory map is only updated once the file write succeeds
    fn write(
        &mut self,
        key: PersistKey,
        data: &[u8],
    ) -> Result<(), StorageError> {
        let mut values = self.values.clone();
        values.insert(key.0, data.to_vec());
        let serialized = serde_json::to_vec(&values)?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, serialized)?;
        fs::rename(&temp_path, &self.path)?;
        self.values = values;
        Ok(())
    }
}

fn copy_into(value: Option<&Vec<u8>>, buf: &mut [u8]) -> usize {
    let Some(value) = value else {
        return 0;
    };
    let len = value.len().min(buf.len());
    buf[..len].copy_from_slice(&value[..len]);
    len
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_shared() {
        let storage = MemoryStorage::new();
        let mut handle = storage.clone();
        handle.write(PersistKey(7), &[1, 2, 3]).unwrap();

        assert!(storage.exists(PersistKey(7)));
        assert!(!storage.exists(PersistKey(8)));
        let mut buf = [0; 8];
        assert_eq!(storage.read(PersistKey(7), &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert_eq!(storage.read(PersistKey(8), &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_memory_fail_writes() {
        let mut storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        assert!(matches!(
            storage.write(PersistKey(2), &[0]),
            Err(StorageError::WriteRejected(PersistKey(2)))
        ));
        assert!(!storage.exists(PersistKey(2)));
    }

    #[test]
    fn test_read_truncates_to_buffer() {
        let storage = MemoryStorage::new();
        storage.insert(PersistKey(1), vec![9; 16]);
        let mut buf = [0; 4];
        assert_eq!(storage.read(PersistKey(1), &mut buf).unwrap(), 4);
        assert_eq!(buf, [9; 4]);
    }

    #[test]
    fn test_file_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("weather.json");
        let mut storage = FileStorage::open(&path).unwrap();
        assert!(!storage.exists(PersistKey::WEATHER_SUN));
        storage.write(PersistKey::WEATHER_SUN, &[4, 5, 6]).unwrap();
        // Temp file was renamed away
        assert!(!path.with_extension("json.tmp").exists());

        let reopened = FileStorage::open(&path).unwrap();
        assert!(reopened.exists(PersistKey::WEATHER_SUN));
        let mut buf = [0; 3];
        let read = reopened.read(PersistKey::WEATHER_SUN, &mut buf).unwrap();
        assert_eq!(read, 3);
        assert_eq!(buf, [4, 5, 6]);
    }

    #[test]
    fn test_file_truncated_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("weather.json");
        fs::write(&path, r#"{"333":[6,0,0,0,15,0,0,0,20,0,0,0,45"#).unwrap();

        let mut storage = FileStorage::open(&path).unwrap();
        assert!(!storage.exists(PersistKey::WEATHER_SUN));

        // The next write replaces the broken file
        storage.write(PersistKey::WEATHER_INFO, &[1]).unwrap();
        let reopened = FileStorage::open(&path).unwrap();
        assert!(reopened.exists(PersistKey::WEATHER_INFO));
    }

    #[test]
    fn test_file_failed_write_keeps_old_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("weather.json");
        let mut storage = FileStorage::open(&path).unwrap();
        storage.write(PersistKey::WEATHER_INFO, &[1]).unwrap();

        // Writing into a directory that no longer exists has to fail
        drop(dir);
        assert!(matches!(
            storage.write(PersistKey::WEATHER_SUN, &[2]),
            Err(StorageError::Io(_))
        ));
        assert!(!storage.exists(PersistKey::WEATHER_SUN));
        assert!(storage.exists(PersistKey::WEATHER_INFO));
    }
}
