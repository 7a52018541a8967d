//! JSON-backed property stores and the per-path store registry.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use tracing::{debug, info};

use super::error::{PropertyError, PropertyResult};

/// File name of the per-directory property store.
pub const DOH_FILE_NAME: &str = "baker.doh";

/// A store shared between the registry and its users.
pub type SharedStore = Arc<Mutex<PropertyStore>>;

/// Key/value properties persisted in one JSON file.
#[derive(Debug)]
pub struct PropertyStore {
    file_path: PathBuf,
    properties: BTreeMap<String, Value>,
    dirty: bool,
}

impl PropertyStore {
    /// Read the backing file, or start empty if it does not exist.
    pub(crate) fn load(file_path: &Path) -> PropertyResult<Self> {
        let properties = if file_path.is_file() {
            let contents =
                std::fs::read_to_string(file_path).map_err(|source| PropertyError::ReadFailed {
                    path: file_path.to_path_buf(),
                    source,
                })?;

            serde_json::from_str::<BTreeMap<String, Value>>(&contents).map_err(|_| {
                PropertyError::Malformed {
                    path: file_path.to_path_buf(),
                    contents: contents.clone(),
                }
            })?
        } else {
            BTreeMap::new()
        };

        debug!(
            path = %file_path.display(),
            properties = properties.len(),
            "Loaded property store"
        );

        Ok(Self {
            file_path: file_path.to_path_buf(),
            properties,
            dirty: false,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Value stored under `name`, or `default` when unset.
    pub fn get_or(&self, name: &str, default: Value) -> Value {
        self.properties.get(name).cloned().unwrap_or(default)
    }

    /// Store `value` under `name` and mark the store dirty.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
        self.dirty = true;
    }

    /// Whether a value changed since the last load or flush.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Property names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Number of stored properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the store holds no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Write the backing file if anything changed.
    ///
    /// Returns whether a write happened.
    pub fn flush_if_dirty(&mut self) -> PropertyResult<bool> {
        if !self.dirty {
            return Ok(false);
        }

        self.write().map_err(|source| PropertyError::WriteFailed {
            path: self.file_path.clone(),
            source,
        })?;
        self.dirty = false;

        debug!(path = %self.file_path.display(), "Flushed property store");
        Ok(true)
    }

    fn write(&self) -> io::Result<()> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.properties
            .serialize(&mut serializer)
            .map_err(io::Error::other)?;
        buf.push(b'\n');

        // Write to temp file first, then rename
        let temp_path = temp_path_for(&self.file_path);
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(&buf)?;
        file.sync_all()?;
        std::fs::rename(&temp_path, &self.file_path)
    }
}

/// `<file name>.tmp` next to `path`, unique per backing file.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// One [`PropertyStore`] per backing file.
#[derive(Debug, Default)]
pub struct PropertyStores {
    stores: DashMap<PathBuf, SharedStore>,
}

impl PropertyStores {
    /// Create an empty store registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the store for `file_path`, loading it on first use.
    pub fn get_or_load(&self, file_path: impl AsRef<Path>) -> PropertyResult<SharedStore> {
        match self.stores.entry(file_path.as_ref().to_path_buf()) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let store = PropertyStore::load(entry.key())?;
                Ok(Arc::clone(entry.insert(Arc::new(Mutex::new(store))).value()))
            }
        }
    }

    /// Load a store that must not exist yet.
    ///
    /// A second construction for the same file is a programming error and
    /// is reported as [`PropertyError::AlreadyLoaded`].
    pub fn load_new(&self, file_path: impl AsRef<Path>) -> PropertyResult<SharedStore> {
        match self.stores.entry(file_path.as_ref().to_path_buf()) {
            Entry::Occupied(entry) => Err(PropertyError::AlreadyLoaded(entry.key().clone())),
            Entry::Vacant(entry) => {
                let store = PropertyStore::load(entry.key())?;
                Ok(Arc::clone(entry.insert(Arc::new(Mutex::new(store))).value()))
            }
        }
    }

    /// The per-directory store, kept in `<dir>/baker.doh`.
    pub fn for_directory(&self, dir: impl AsRef<Path>) -> PropertyResult<SharedStore> {
        self.get_or_load(dir.as_ref().join(DOH_FILE_NAME))
    }

    /// Number of loaded stores.
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Whether no store has been loaded.
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Flush every dirty store, returning how many were written.
    pub fn flush_all(&self) -> PropertyResult<usize> {
        let mut written = 0;
        for entry in self.stores.iter() {
            if entry.value().lock().flush_if_dirty()? {
                written += 1;
            }
        }

        if written > 0 {
            info!(written, "Flushed property stores");
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let store = PropertyStore::load(&temp.path().join("props.json")).unwrap();

        assert!(store.is_empty());
        assert!(!store.is_dirty());
        assert_eq!(store.get_or("missing", json!(3)), json!(3));
    }

    #[test]
    fn test_set_marks_dirty_and_flush_writes_sorted() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("props.json");
        let mut store = PropertyStore::load(&path).unwrap();

        store.set("zeta", json!(1));
        store.set("alpha", json!(["a.h"]));
        assert!(store.is_dirty());

        assert!(store.flush_if_dirty().unwrap());
        assert!(!store.is_dirty());

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "{\n    \"alpha\": [\n        \"a.h\"\n    ],\n    \"zeta\": 1\n}\n"
        );
        assert!(!temp.path().join("props.json.tmp").exists());
    }

    #[test]
    fn test_stores_sharing_a_stem_use_distinct_temp_files() {
        let temp = TempDir::new().unwrap();
        let json_path = temp.path().join("a.json");
        let doh_path = temp.path().join("a.doh");

        assert_ne!(temp_path_for(&json_path), temp_path_for(&doh_path));
        assert_eq!(temp_path_for(&doh_path), temp.path().join("a.doh.tmp"));

        let mut json_store = PropertyStore::load(&json_path).unwrap();
        let mut doh_store = PropertyStore::load(&doh_path).unwrap();
        json_store.set("kind", json!("json"));
        doh_store.set("kind", json!("doh"));
        assert!(json_store.flush_if_dirty().unwrap());
        assert!(doh_store.flush_if_dirty().unwrap());

        let reread = PropertyStore::load(&doh_path).unwrap();
        assert_eq!(reread.get("kind"), Some(&json!("doh")));
        let reread = PropertyStore::load(&json_path).unwrap();
        assert_eq!(reread.get("kind"), Some(&json!("json")));
    }

    #[test]
    fn test_clean_store_does_not_write() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("props.json");
        let mut store = PropertyStore::load(&path).unwrap();

        assert!(!store.flush_if_dirty().unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_values_survive_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("props.json");

        let mut store = PropertyStore::load(&path).unwrap();
        store.set("hash", "0f3a");
        store.flush_if_dirty().unwrap();

        let reloaded = PropertyStore::load(&path).unwrap();
        assert_eq!(reloaded.get("hash"), Some(&json!("0f3a")));
        assert_eq!(reloaded.names().collect::<Vec<_>>(), vec!["hash"]);
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("props.json");
        std::fs::write(&path, "not json").unwrap();

        match PropertyStore::load(&path) {
            Err(PropertyError::Malformed { contents, .. }) => assert_eq!(contents, "not json"),
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_json_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("props.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        assert!(matches!(
            PropertyStore::load(&path),
            Err(PropertyError::Malformed { .. })
        ));
    }

    #[test]
    fn test_registry_returns_shared_store() {
        let temp = TempDir::new().unwrap();
        let stores = PropertyStores::new();
        let path = temp.path().join("props.json");

        let first = stores.get_or_load(&path).unwrap();
        let second = stores.get_or_load(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(stores.len(), 1);
    }

    #[test]
    fn test_duplicate_construction_is_an_error() {
        let temp = TempDir::new().unwrap();
        let stores = PropertyStores::new();
        let path = temp.path().join("props.json");

        stores.load_new(&path).unwrap();
        assert!(matches!(
            stores.load_new(&path),
            Err(PropertyError::AlreadyLoaded(_))
        ));
    }

    #[test]
    fn test_for_directory_uses_doh_file() {
        let temp = TempDir::new().unwrap();
        let stores = PropertyStores::new();

        let doh = stores.for_directory(temp.path()).unwrap();
        doh.lock().set("built", true);

        assert_eq!(stores.flush_all().unwrap(), 1);
        assert!(temp.path().join(DOH_FILE_NAME).is_file());
        assert_eq!(stores.flush_all().unwrap(), 0);
    }
}
