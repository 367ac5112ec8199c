//! Transaction (loan) model

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{book::Book, dates};

/// Book reference inside a transaction: a bare id or the nested record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BookRef {
    Id(i64),
    Detail(Box<Book>),
}

impl BookRef {
    pub fn id(&self) -> i64 {
        match self {
            BookRef::Id(id) => *id,
            BookRef::Detail(book) => book.id,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            BookRef::Id(_) => None,
            BookRef::Detail(book) => Some(&book.title),
        }
    }
}

/// One checkout of one book by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub book: BookRef,
    #[serde(default)]
    pub user: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "dates::optional")]
    pub checkout_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "dates::optional")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "dates::optional")]
    pub return_date: Option<NaiveDate>,
    /// Computed by the server; absent or zero when the loan is on time
    #[serde(default)]
    pub overdue_penalty: Option<Decimal>,
}

impl Transaction {
    pub fn is_returned(&self) -> bool {
        self.return_date.is_some()
    }

    /// Still out and past its due date as of `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_returned() && self.due_date.is_some_and(|due| due < today)
    }

    pub fn penalty(&self) -> Decimal {
        self.overdue_penalty.unwrap_or(Decimal::ZERO)
    }

    pub fn status(&self, today: NaiveDate) -> &'static str {
        if self.is_returned() {
            "returned"
        } else if self.is_overdue(today) {
            "overdue"
        } else {
            "borrowed"
        }
    }
}
