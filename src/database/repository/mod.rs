//! Repository module - MongoDB implementations of the storage traits.

mod content_repository;
mod subscriber_repository;

pub use content_repository::ContentRepository;
pub use subscriber_repository::SubscriberRepository;
