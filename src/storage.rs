//! Key-addressed blob storage.
//!
//! The pipeline only needs `get`, `put` and `delete`. `FsObjectStore` maps a
//! bucket onto a local directory; `MemoryObjectStore` keeps everything in
//! process and backs the tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

/// Contract for the external blob service.
///
/// No caching or retry happens behind it: every call either succeeds or
/// reports the failure for the key it was given.
pub trait ObjectStore {
    fn get(&self, key: &str) -> PipelineResult<Vec<u8>>;
    /// Writes `bytes` under `key`, replacing any existing object.
    fn put(&self, key: &str, bytes: &[u8]) -> PipelineResult<()>;
    fn delete(&self, key: &str) -> PipelineResult<()>;
}

impl<T: ObjectStore + ?Sized> ObjectStore for &T {
    fn get(&self, key: &str) -> PipelineResult<Vec<u8>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, bytes: &[u8]) -> PipelineResult<()> {
        (**self).put(key, bytes)
    }

    fn delete(&self, key: &str) -> PipelineResult<()> {
        (**self).delete(key)
    }
}

/// Keys are `/`-separated relative paths without empty, `.` or `..` segments.
pub fn validate_key(key: &str) -> PipelineResult<()> {
    if key.is_empty() {
        return Err(PipelineError::value("object key must not be empty"));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(PipelineError::value(format!(
            "object key `{key}` must be a relative `/`-separated path"
        )));
    }
    if key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return Err(PipelineError::value(format!(
            "object key `{key}` contains an empty or relative segment"
        )));
    }
    Ok(())
}

/// Bucket stored as a directory tree at `<root>/<bucket>`.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl AsRef<Path>, bucket: &str) -> PipelineResult<Self> {
        validate_key(bucket)?;
        Ok(Self {
            root: root.as_ref().join(bucket),
        })
    }

    pub fn from_config(cfg: &PipelineConfig) -> PipelineResult<Self> {
        Self::new(&cfg.store_root, &cfg.bucket)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> PipelineResult<PathBuf> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, seg| path.join(seg)))
    }
}

impl ObjectStore for FsObjectStore {
    fn get(&self, key: &str) -> PipelineResult<Vec<u8>> {
        let path = self.object_path(key)?;
        let bytes = fs::read(&path).map_err(|e| PipelineError::io(key, e))?;
        log::debug!("get {key}: {} bytes from {}", bytes.len(), path.display());
        Ok(bytes)
    }

    fn put(&self, key: &str, bytes: &[u8]) -> PipelineResult<()> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| PipelineError::io(key, e))?;
        }
        fs::write(&path, bytes).map_err(|e| PipelineError::io(key, e))?;
        log::debug!("put {key}: {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    fn delete(&self, key: &str) -> PipelineResult<()> {
        let path = self.object_path(key)?;
        fs::remove_file(&path).map_err(|e| PipelineError::io(key, e))?;
        log::debug!("delete {key}");
        Ok(())
    }
}

/// In-process store.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects().keys().cloned().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects().contains_key(key)
    }

    fn objects(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get(&self, key: &str) -> PipelineResult<Vec<u8>> {
        validate_key(key)?;
        self.objects()
            .get(key)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound {
                key: key.to_string(),
            })
    }

    fn put(&self, key: &str, bytes: &[u8]) -> PipelineResult<()> {
        validate_key(key)?;
        self.objects().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> PipelineResult<()> {
        validate_key(key)?;
        self.objects()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| PipelineError::NotFound {
                key: key.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::tempdir;

    #[test]
    fn test_validate_key() {
        for good in ["data/train.csv", "params/v1/model.json", "a"] {
            assert!(validate_key(good).is_ok(), "{good}");
        }
        for bad in ["", "/abs/key", "a//b", "a/../b", "./a", "trailing/", "a\\b"] {
            let err = validate_key(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Value, "{bad}");
        }
    }

    #[test]
    fn test_fs_store_put_get_delete() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::new(dir.path(), "bucket").unwrap();

        store.put("params/v1/model.json", b"first").unwrap();
        assert!(dir.path().join("bucket/params/v1/model.json").is_file());
        assert_eq!(store.get("params/v1/model.json").unwrap(), b"first");

        store.put("params/v1/model.json", b"second").unwrap();
        assert_eq!(store.get("params/v1/model.json").unwrap(), b"second");

        store.delete("params/v1/model.json").unwrap();
        let err = store.get("params/v1/model.json").unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { .. }));
    }

    #[test]
    fn test_fs_store_missing_delete() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::new(dir.path(), "bucket").unwrap();

        let err = store.delete("params/v9/model.json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_fs_store_rejects_escaping_keys() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::new(dir.path(), "bucket").unwrap();

        assert!(store.put("../outside", b"x").is_err());
        assert!(!dir.path().join("outside").exists());
        assert!(FsObjectStore::new(dir.path(), "..").is_err());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryObjectStore::new();
        store.put("data/a.csv", b"x,y\n").unwrap();
        store.put("data/a.csv", b"x,y\n1,2\n").unwrap();

        assert_eq!(store.get("data/a.csv").unwrap(), b"x,y\n1,2\n");
        assert_eq!(store.keys(), vec!["data/a.csv".to_string()]);

        store.delete("data/a.csv").unwrap();
        assert!(!store.contains("data/a.csv"));
        assert!(matches!(
            store.delete("data/a.csv").unwrap_err(),
            PipelineError::NotFound { .. }
        ));
    }

    #[test]
    fn test_store_by_reference() {
        fn roundtrip(store: impl ObjectStore) -> Vec<u8> {
            store.put("k", b"v").unwrap();
            store.get("k").unwrap()
        }

        let store = MemoryObjectStore::new();
        assert_eq!(roundtrip(&store), b"v");
        assert!(store.contains("k"));
    }
}
