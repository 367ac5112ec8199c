use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;

use super::{SessionKey, SessionStore};
use crate::error::{ClientError, ClientResult};

/// Session store persisted as a small JSON object on disk.
///
/// The file is read once on open and replaced after every change, so the
/// session survives restarts until logout or forced invalidation. It holds
/// bearer credentials and is only readable by its owner.
#[cfg(unix)]
const SESSION_FILE_MODE: u32 = 0o600;

#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileSessionStore {
    /// Open the store at `path`. A missing or unparseable file is an
    /// empty session.
    pub fn open(path: impl Into<PathBuf>) -> ClientResult<Self> {
        let path = path.into();
        let values = match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!(
                        "Discarding invalid session file {}: {}",
                        path.display(),
                        e
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(ClientError::Session(format!(
                    "Failed to read session file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        tracing::debug!("Opened session file {} ({} keys)", path.display(), values.len());

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(&self, change: impl FnOnce(&mut BTreeMap<String, String>)) -> ClientResult<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| ClientError::Session("session lock poisoned".to_string()))?;
        change(&mut values);
        self.flush(&values)
    }

    /// Write to a private temp file next to the target, then rename it over
    /// the old session.
    fn flush(&self, values: &BTreeMap<String, String>) -> ClientResult<()> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(|e| {
                    ClientError::Session(format!("Failed to create {}: {}", parent.display(), e))
                })?;
                parent
            }
            None => Path::new("."),
        };

        let bytes = serde_json::to_vec_pretty(values)
            .map_err(|e| ClientError::Session(format!("Failed to encode session: {}", e)))?;

        let write_error = |e: std::io::Error| {
            ClientError::Session(format!(
                "Failed to write session file {}: {}",
                self.path.display(),
                e
            ))
        };

        let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.as_file()
                .set_permissions(fs::Permissions::from_mode(SESSION_FILE_MODE))
                .map_err(write_error)?;
        }
        file.write_all(&bytes).map_err(write_error)?;
        file.as_file().sync_all().map_err(write_error)?;
        file.persist(&self.path)
            .map_err(|e| write_error(e.error))?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: SessionKey) -> ClientResult<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| ClientError::Session("session lock poisoned".to_string()))?;
        Ok(values.get(key.as_str()).cloned())
    }

    fn set(&self, key: SessionKey, value: &str) -> ClientResult<()> {
        self.update(|values| {
            values.insert(key.as_str().to_string(), value.to_string());
        })
    }

    fn remove(&self, key: SessionKey) -> ClientResult<()> {
        self.update(|values| {
            values.remove(key.as_str());
        })
    }

    fn clear(&self) -> ClientResult<()> {
        self.update(|values| values.clear())
    }
}
