//! Voice clone records, maintained by the cloning pipeline and read here

use super::ids::{UserId, VoiceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Training state of a voice clone.
///
/// Only `Success` clones are eligible for voice-name listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainStatus {
    Pending,
    Training,
    Success,
    Failed,
}

impl TrainStatus {
    /// Numeric code used in storage.
    pub fn code(self) -> i64 {
        match self {
            TrainStatus::Pending => 0,
            TrainStatus::Training => 1,
            TrainStatus::Success => 2,
            TrainStatus::Failed => 3,
        }
    }

    /// Decode a storage code, `None` for unknown values.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(TrainStatus::Pending),
            1 => Some(TrainStatus::Training),
            2 => Some(TrainStatus::Success),
            3 => Some(TrainStatus::Failed),
            _ => None,
        }
    }
}

/// A user-trained voice clone.
///
/// The cloning pipeline owns these rows. This crate only ingests them for
/// tests and reads them when assembling voice-name listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceCloneRecord {
    /// Unique clone id, same id space as timbre ids
    pub id: VoiceId,
    /// TTS model the clone was trained against
    pub tts_model_id: String,
    /// Owning platform user
    pub user_id: UserId,
    /// Name given by the user
    pub name: String,
    /// Training state
    pub train_status: TrainStatus,
    /// When training was requested
    pub created_at: DateTime<Utc>,
}

impl VoiceCloneRecord {
    /// Whether this clone may appear in listings.
    pub fn is_trained(&self) -> bool {
        self.train_status == TrainStatus::Success
    }
}
