//! Client-side session storage.
//!
//! Tokens and the user summary live under fixed keys in an injected
//! [`SessionStore`]. [`MemorySessionStore`] keeps them for the life of the
//! process; [`FileSessionStore`] persists them between runs.

mod file;
mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use crate::{
    error::{ClientError, ClientResult},
    models::{Session, UserRecord},
};

/// Fixed storage keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SessionKey {
    AccessToken,
    RefreshToken,
    User,
}

impl SessionKey {
    pub const ALL: [SessionKey; 3] = [
        SessionKey::AccessToken,
        SessionKey::RefreshToken,
        SessionKey::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKey::AccessToken => "access_token",
            SessionKey::RefreshToken => "refresh_token",
            SessionKey::User => "user",
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key/value storage for the credential pair and user record.
///
/// Implementations use interior mutability; every call completes
/// synchronously so no two writers interleave within one call.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: SessionKey) -> ClientResult<Option<String>>;

    fn set(&self, key: SessionKey, value: &str) -> ClientResult<()>;

    fn remove(&self, key: SessionKey) -> ClientResult<()>;

    /// Drop every stored key
    fn clear(&self) -> ClientResult<()> {
        for key in SessionKey::ALL {
            self.remove(key)?;
        }
        Ok(())
    }

    fn access_token(&self) -> ClientResult<Option<String>> {
        self.get(SessionKey::AccessToken)
    }

    fn refresh_token(&self) -> ClientResult<Option<String>> {
        self.get(SessionKey::RefreshToken)
    }

    fn set_access_token(&self, token: &str) -> ClientResult<()> {
        self.set(SessionKey::AccessToken, token)
    }

    fn set_refresh_token(&self, token: &str) -> ClientResult<()> {
        self.set(SessionKey::RefreshToken, token)
    }

    /// Whether a user record is stored at all, parseable or not
    fn has_user(&self) -> ClientResult<bool> {
        Ok(self.get(SessionKey::User)?.is_some())
    }

    fn user(&self) -> ClientResult<Option<UserRecord>> {
        match self.get(SessionKey::User)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| ClientError::Session(format!("Invalid stored user record: {}", e))),
            None => Ok(None),
        }
    }

    /// Store a whole session, as after login or registration
    fn save(&self, session: &Session) -> ClientResult<()> {
        let user = serde_json::to_string(&session.user)
            .map_err(|e| ClientError::Session(format!("Failed to encode user record: {}", e)))?;
        self.set(SessionKey::AccessToken, &session.access_token)?;
        self.set(SessionKey::RefreshToken, &session.refresh_token)?;
        self.set(SessionKey::User, &user)
    }
}
