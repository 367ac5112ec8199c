//! Dashboard statistics

use serde::Serialize;
use serde_json::Value;

use crate::{api::ApiClient, error::ClientResult, models::Listing};

/// Counters shown on the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_books: u64,
    pub available_books: u64,
    pub my_books: u64,
    pub overdue_books: u64,
}

#[derive(Clone)]
pub struct StatsService {
    client: ApiClient,
}

impl StatsService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Fetch the four listings concurrently. A listing that fails counts as
    /// zero rather than failing the whole dashboard.
    pub async fn dashboard(&self) -> DashboardStats {
        let (books, available, mine, overdue) = tokio::join!(
            self.count("/books/"),
            self.count("/available-books/"),
            self.count("/my-books/"),
            self.count("/overdue-books/"),
        );

        DashboardStats {
            total_books: books,
            available_books: available,
            my_books: mine,
            overdue_books: overdue,
        }
    }

    async fn count(&self, path: &str) -> u64 {
        let listing: ClientResult<Listing<Value>> = self.client.get(path).await;
        match listing {
            Ok(listing) => listing.total(),
            Err(e) => {
                tracing::debug!("Dashboard counter {} unavailable: {}", path, e);
                0
            }
        }
    }
}
