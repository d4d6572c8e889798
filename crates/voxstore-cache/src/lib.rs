//! voxstore-cache - platform cache layer for voxstore
//!
//! A namespaced key/value cache holding serialized values, with two
//! retention modes: entries stored with the default TTL and entries pinned
//! forever. Keys for the shared namespace are derived in [`keys`] so
//! subsystems cannot collide.

pub mod cache;
pub mod error;
pub mod keys;

pub use cache::{CacheConfig, CacheStats, LookupCache, Retention};
pub use error::CacheError;
