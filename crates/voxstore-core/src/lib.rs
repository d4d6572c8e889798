//! voxstore-core - voice timbre catalog
//!
//! Record models, the SQLite-backed voice store, the TTS-model catalog
//! seam, and [`TimbreService`], the cache-aside lookup layer in front of
//! the store.

pub mod catalog;
pub mod error;
pub mod models;
pub mod service;
pub mod store;

pub use catalog::{ModelCatalog, PermissiveCatalog, RegistryCatalog};
pub use error::CoreError;
pub use models::{
    Page, PageQuery, TimbreDetails, TimbreFilter, TimbreRecord, TimbreUpsert, TrainStatus, UserId,
    VoiceCloneRecord, VoiceId, VoiceName,
};
pub use service::{TimbreService, TimbreServiceConfig};
pub use store::VoiceStore;
