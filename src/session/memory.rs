use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{SessionKey, SessionStore};
use crate::error::{ClientError, ClientResult};

/// Session store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: RwLock<BTreeMap<SessionKey, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with the given pairs
    pub fn with_values<'a>(values: impl IntoIterator<Item = (SessionKey, &'a str)>) -> Self {
        Self {
            values: RwLock::new(
                values
                    .into_iter()
                    .map(|(key, value)| (key, value.to_string()))
                    .collect(),
            ),
        }
    }
}

fn poisoned<E>(_: E) -> ClientError {
    ClientError::Session("session lock poisoned".to_string())
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: SessionKey) -> ClientResult<Option<String>> {
        Ok(self.values.read().map_err(poisoned)?.get(&key).cloned())
    }

    fn set(&self, key: SessionKey, value: &str) -> ClientResult<()> {
        self.values
            .write()
            .map_err(poisoned)?
            .insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: SessionKey) -> ClientResult<()> {
        self.values.write().map_err(poisoned)?.remove(&key);
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        self.values.write().map_err(poisoned)?.clear();
        Ok(())
    }
}
