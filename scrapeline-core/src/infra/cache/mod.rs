//! Persistent cache backends.

pub mod translation_store;

pub use translation_store::{DiskTranslationCache, translation_cache_key_for};
