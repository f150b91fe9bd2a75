//! Database module exports.

pub mod models;
mod mongo;
mod repository;
pub mod store;

pub use models::*;
pub use mongo::Database;
pub use repository::{ContentRepository, SubscriberRepository};
pub use store::{ContentStore, SubscriberDirectory};
