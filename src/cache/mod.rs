//! Cache module - typed in-process caches backed by Moka.
//!
//! Repositories own their caches directly; there is no global registry.

mod config;
mod typed;

pub use config::CacheConfig;
pub use typed::TypedCache;
