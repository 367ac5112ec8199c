//! Loan service: checkout, return and the per-user loan listings

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    api::ApiClient,
    error::ClientResult,
    models::{Listing, Transaction},
};

#[derive(Debug, Serialize)]
struct CheckoutRequest {
    book: i64,
    checkout_date: NaiveDate,
}

#[derive(Debug, Serialize)]
struct ReturnRequest {
    return_date: NaiveDate,
}

#[derive(Clone)]
pub struct LoansService {
    client: ApiClient,
}

impl LoansService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Borrow a book. The server computes the due date.
    pub async fn checkout(&self, book_id: i64, checkout_date: NaiveDate) -> ClientResult<Transaction> {
        let tx: Transaction = self
            .client
            .post(
                "/checkout/",
                &CheckoutRequest {
                    book: book_id,
                    checkout_date,
                },
            )
            .await?;
        tracing::info!("Checked out book {} as transaction {}", book_id, tx.id);
        Ok(tx)
    }

    /// Return a borrowed book
    pub async fn return_book(
        &self,
        transaction_id: i64,
        return_date: NaiveDate,
    ) -> ClientResult<Transaction> {
        let tx: Transaction = self
            .client
            .patch(
                &format!("/return/{}/", transaction_id),
                &ReturnRequest { return_date },
            )
            .await?;
        tracing::info!("Returned transaction {}", transaction_id);
        Ok(tx)
    }

    /// Loans the signed-in user still holds
    pub async fn my_books(&self) -> ClientResult<Listing<Transaction>> {
        self.client.get("/my-books/").await
    }

    pub async fn overdue_books(&self) -> ClientResult<Listing<Transaction>> {
        self.client.get("/overdue-books/").await
    }

    /// Every loan of the signed-in user, returned or not
    pub async fn transaction_history(&self) -> ClientResult<Listing<Transaction>> {
        self.client.get("/transaction-history/").await
    }
}
