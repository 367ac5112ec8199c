//! List envelope.
//!
//! Paginated endpoints wrap rows as `{count, next, previous, results}`, while
//! unpaginated ones return a bare array. Callers accept either.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Paginated(Page<T>),
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    /// Rows in this response
    pub fn items(&self) -> &[T] {
        match self {
            Listing::Paginated(page) => &page.results,
            Listing::Bare(items) => items,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Paginated(page) => page.results,
            Listing::Bare(items) => items,
        }
    }

    /// Total number of rows across all pages when the server reports it
    pub fn total(&self) -> u64 {
        match self {
            Listing::Paginated(page) => page.count,
            Listing::Bare(items) => items.len() as u64,
        }
    }

    pub fn has_next(&self) -> bool {
        matches!(self, Listing::Paginated(Page { next: Some(_), .. }))
    }
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Listing::Bare(Vec::new())
    }
}
