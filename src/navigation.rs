//! Screen navigation seam.
//!
//! The client never touches a global location; it asks the injected
//! [`Navigator`] where the user is and where to send them.

use std::sync::RwLock;

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const HOME_PATH: &str = "/";

pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;

    fn navigate(&self, path: &str);
}

/// Login, registration and landing screens never get bounced to login
pub fn is_entry_screen(path: &str) -> bool {
    path.contains(LOGIN_PATH) || path.contains(REGISTER_PATH) || path == HOME_PATH
}

/// In-memory location with a record of every forced navigation
#[derive(Debug)]
pub struct ScreenNavigator {
    current: RwLock<String>,
    redirects: RwLock<Vec<String>>,
}

impl ScreenNavigator {
    pub fn new(initial: &str) -> Self {
        Self {
            current: RwLock::new(initial.to_string()),
            redirects: RwLock::new(Vec::new()),
        }
    }

    /// Move to a screen on the user's own initiative
    pub fn visit(&self, path: &str) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = path.to_string();
    }

    /// Every path `navigate` was asked for, oldest first
    pub fn redirects(&self) -> Vec<String> {
        self.redirects
            .read()
            .map(|r| r.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }
}

impl Default for ScreenNavigator {
    fn default() -> Self {
        Self::new(HOME_PATH)
    }
}

impl Navigator for ScreenNavigator {
    fn current_path(&self) -> String {
        self.current
            .read()
            .map(|p| p.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    fn navigate(&self, path: &str) {
        tracing::debug!("Navigating to {}", path);
        self.visit(path);
        self.redirects
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.to_string());
    }
}

/// Navigator for headless use: stays on `/` and ignores redirects
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn current_path(&self) -> String {
        HOME_PATH.to_string()
    }

    fn navigate(&self, _path: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_screens() {
        assert!(is_entry_screen("/"));
        assert!(is_entry_screen("/login"));
        assert!(is_entry_screen("/register"));
        assert!(!is_entry_screen("/my-books"));
        assert!(!is_entry_screen("/books"));
    }

    #[test]
    fn test_screen_navigator_records_redirects() {
        let nav = ScreenNavigator::new("/profile");
        nav.visit("/history");
        assert!(nav.redirects().is_empty());

        nav.navigate(LOGIN_PATH);
        assert_eq!(nav.current_path(), LOGIN_PATH);
        assert_eq!(nav.redirects(), vec![LOGIN_PATH.to_string()]);
    }
}
