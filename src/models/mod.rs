//! Data models exchanged with the library API

pub mod book;
pub mod dates;
pub mod listing;
pub mod transaction;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookForm, BookQuery};
pub use listing::{Listing, Page};
pub use transaction::{BookRef, Transaction};
pub use user::{LoginResponse, Profile, RefreshResponse, Role, Session, UserRecord};
