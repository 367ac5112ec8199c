//! Book (catalog entry) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::dates;

/// Book as returned by the catalog endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default, deserialize_with = "dates::optional")]
    pub published_date: Option<NaiveDate>,
    #[serde(default)]
    pub copies_available: i32,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.copies_available > 0
    }
}

/// Create / update payload for the admin book screen
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BookForm {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "ISBN is required"))]
    pub isbn: String,
    pub published_date: NaiveDate,
    #[validate(range(min = 1, message = "There must be more than a single copy available"))]
    pub copies_available: i32,
}

/// Search filters for the available-books listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookQuery {
    /// Free-text search over title, author and ISBN
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    /// Only books with at least one copy on the shelf
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_after: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_before: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_published: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl BookQuery {
    /// Query used by the public books screen: search term, available only
    pub fn search(term: &str) -> Self {
        let term = term.trim();
        Self {
            search: (!term.is_empty()).then(|| term.to_string()),
            available: Some(true),
            ..Default::default()
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_book_decodes_with_missing_optional_fields() {
        let book: Book = serde_json::from_value(json!({
            "id": 7,
            "title": "Dune",
            "author": "Frank Herbert"
        }))
        .unwrap();
        assert_eq!(book.published_date, None);
        assert!(!book.is_available());
    }

    #[test]
    fn test_book_form_validation() {
        let mut form = BookForm {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: "9780441013593".to_string(),
            published_date: NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
            copies_available: 2,
        };
        assert!(form.validate().is_ok());

        form.copies_available = 0;
        let errors = form.validate().unwrap_err();
        assert!(errors.to_string().contains("more than a single copy"));

        form.copies_available = 1;
        form.title.clear();
        assert!(form.validate().unwrap_err().to_string().contains("Title is required"));
    }

    #[test]
    fn test_search_query_skips_blank_term() {
        let query = BookQuery::search("   ").page(2);
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value, json!({"available": true, "page": 2}));
    }
}
