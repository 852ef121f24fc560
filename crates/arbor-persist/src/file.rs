use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use arbor_types::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::PersistResult;
use crate::traits::StatePersistor;

/// Persists state as a pretty-printed JSON document.
///
/// Saves write a temporary file next to the target and rename it into
/// place, so a crash mid-save leaves the previous snapshot intact.
#[derive(Clone, Debug)]
pub struct JsonFilePersistor {
    path: PathBuf,
}

impl JsonFilePersistor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl StatePersistor for JsonFilePersistor {
    fn load(&self) -> PersistResult<Option<Value>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let state = serde_json::from_str(&text)?;
        debug!(path = %self.path.display(), "state loaded");
        Ok(Some(state))
    }

    fn save(&self, state: &Value) -> PersistResult<()> {
        let bytes = serde_json::to_vec_pretty(state)?;
        fs::create_dir_all(self.dir())?;
        let mut tmp = NamedTempFile::new_in(self.dir())?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "state saved");
        Ok(())
    }

    fn clear(&self) -> PersistResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::PersistError;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let p = JsonFilePersistor::new(dir.path().join("state.json"));
        assert!(p.load().unwrap().is_none());
        assert!(!p.clear().unwrap());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let p = JsonFilePersistor::new(dir.path().join("nested/state.json"));
        p.save(&json!({ "counter": 3 })).unwrap();
        p.save(&json!({ "counter": 4 })).unwrap();
        assert_eq!(p.load().unwrap(), Some(json!({ "counter": 4 })));

        // Only the snapshot remains; temp files were renamed away.
        let files = fs::read_dir(dir.path().join("nested")).unwrap().count();
        assert_eq!(files, 1);

        assert!(p.clear().unwrap());
        assert!(p.load().unwrap().is_none());
    }

    #[test]
    fn corrupt_files_are_serialization_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        let err = JsonFilePersistor::new(&path).load().unwrap_err();
        assert!(matches!(err, PersistError::Serialization(_)));
    }
}
