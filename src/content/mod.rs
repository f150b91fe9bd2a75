//! Content pipeline: generation, on-demand resolution and daily fanout.

pub mod fanout;
pub mod generator;
pub mod message;
pub mod resolver;

pub use fanout::FanoutJob;
pub use generator::{ContentGenerator, OpenAiGenerator};
pub use message::horoscope_message;
pub use resolver::ContentResolver;
