//! Database models.

pub mod content_record;
pub mod subscriber;

pub use content_record::ContentRecord;
pub use subscriber::{GroupCount, Registration, Subscriber};
