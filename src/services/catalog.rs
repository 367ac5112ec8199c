//! Catalog service: browsing, search and admin book management

use serde_json::Value;
use validator::Validate;

use crate::{
    api::ApiClient,
    error::{ClientError, ClientResult},
    models::{Book, BookForm, BookQuery, Listing},
};

#[derive(Clone)]
pub struct CatalogService {
    client: ApiClient,
}

impl CatalogService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Full catalog, including books with no copy on the shelf
    pub async fn list_books(&self) -> ClientResult<Listing<Book>> {
        self.client.get("/books/").await
    }

    /// One page of the full catalog. The listing paginates but does not
    /// filter.
    pub async fn list_books_page(&self, page: u32) -> ClientResult<Listing<Book>> {
        let query = BookQuery {
            page: Some(page),
            ..Default::default()
        };
        self.client.get_with_query("/books/", &query).await
    }

    /// Search the available-books listing
    pub async fn search_available(&self, query: &BookQuery) -> ClientResult<Listing<Book>> {
        self.client.get_with_query("/available-books/", query).await
    }

    pub async fn get_book(&self, id: i64) -> ClientResult<Book> {
        self.client.get(&format!("/books/{}/", id)).await
    }

    pub async fn create_book(&self, form: &BookForm) -> ClientResult<Book> {
        validate_form(form)?;
        let book: Book = self.client.post("/books/", form).await?;
        tracing::info!("Created book {} ({})", book.id, book.title);
        Ok(book)
    }

    pub async fn update_book(&self, id: i64, form: &BookForm) -> ClientResult<Book> {
        validate_form(form)?;
        let book: Book = self.client.put(&format!("/books/{}/", id), form).await?;
        tracing::info!("Updated book {}", id);
        Ok(book)
    }

    pub async fn delete_book(&self, id: i64) -> ClientResult<()> {
        let _: Value = self.client.delete(&format!("/books/{}/", id)).await?;
        tracing::info!("Deleted book {}", id);
        Ok(())
    }
}

fn validate_form(form: &BookForm) -> ClientResult<()> {
    form.validate()
        .map_err(|e| ClientError::InvalidInput(e.to_string()))
}
