//! Data models for the timbre catalog

pub mod ids;
pub mod page;
pub mod timbre;
pub mod voice_clone;

pub use ids::{UserId, VoiceId};
pub use page::{MAX_PAGE_SIZE, Page, PageQuery};
pub use timbre::{TimbreDetails, TimbreFilter, TimbreRecord, TimbreUpsert, VoiceName};
pub use voice_clone::{TrainStatus, VoiceCloneRecord};
