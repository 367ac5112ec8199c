//! Library Management System client
//!
//! Authenticated client for the library REST API: book browsing and search,
//! checkout and return of loans, sign-in with silent token refresh, password
//! reset, profile, transaction history and admin book management.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod navigation;
pub mod services;
pub mod session;

pub use api::ApiClient;
pub use config::AppConfig;
pub use error::{ClientError, ClientResult};
pub use services::Services;
