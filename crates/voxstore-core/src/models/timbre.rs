//! Timbre records and their query/projection companions

use super::ids::VoiceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored timbre: one selectable voice of a TTS model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimbreRecord {
    /// Unique voice id
    pub id: VoiceId,
    /// TTS model this voice belongs to
    pub tts_model_id: String,
    /// Human-readable voice name
    pub name: String,
    /// Vendor-side code passed to the synthesis engine
    pub voice_code: String,
    /// Languages the voice supports, free-form
    pub languages: Option<String>,
    /// Operator remark
    pub remark: Option<String>,
    /// Sort weight, ascending
    pub sort: i64,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

impl TimbreRecord {
    /// Materialize a record from caller-supplied fields.
    pub fn from_upsert(id: VoiceId, upsert: &TimbreUpsert, at: DateTime<Utc>) -> Self {
        Self {
            id,
            tts_model_id: upsert.tts_model_id.clone(),
            name: upsert.name.clone(),
            voice_code: upsert.voice_code.clone(),
            languages: upsert.languages.clone(),
            remark: upsert.remark.clone(),
            sort: upsert.sort,
            created_at: at,
            updated_at: at,
        }
    }

    /// Project into the detail shape served to clients.
    pub fn details(&self) -> TimbreDetails {
        TimbreDetails {
            id: self.id.clone(),
            tts_model_id: self.tts_model_id.clone(),
            name: self.name.clone(),
            voice_code: self.voice_code.clone(),
            languages: self.languages.clone(),
            remark: self.remark.clone(),
            sort: self.sort,
        }
    }
}

/// Caller-supplied fields for create and update.
///
/// Ids and timestamps are owned by the service, so they never appear here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimbreUpsert {
    pub tts_model_id: String,
    pub name: String,
    pub voice_code: String,
    pub languages: Option<String>,
    pub remark: Option<String>,
    pub sort: i64,
}

/// Client-facing detail view of a timbre.
///
/// This is the shape that gets cached, so field changes here invalidate
/// previously cached payloads only by failing to decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimbreDetails {
    pub id: VoiceId,
    pub tts_model_id: String,
    pub name: String,
    pub voice_code: String,
    pub languages: Option<String>,
    pub remark: Option<String>,
    pub sort: i64,
}

/// Minimal id/name pair for selection lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceName {
    pub id: VoiceId,
    pub name: String,
}

impl VoiceName {
    pub fn new(id: impl Into<VoiceId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Filter for timbre listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimbreFilter {
    /// Exact match on the owning TTS model
    pub tts_model_id: String,
    /// Substring match on the voice name, case folding per store collation
    pub name_like: Option<String>,
}

impl TimbreFilter {
    /// Filter by model only.
    pub fn for_model(tts_model_id: impl Into<String>) -> Self {
        Self {
            tts_model_id: tts_model_id.into(),
            name_like: None,
        }
    }

    /// Narrow the filter to names containing `fragment`.
    pub fn with_name_like(mut self, fragment: impl Into<String>) -> Self {
        self.name_like = Some(fragment.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_upsert() -> TimbreUpsert {
        TimbreUpsert {
            tts_model_id: "tts-edge".to_string(),
            name: "Luna".to_string(),
            voice_code: "zh-CN-XiaoxiaoNeural".to_string(),
            languages: Some("zh,en".to_string()),
            remark: None,
            sort: 5,
        }
    }

    #[test]
    fn test_from_upsert_stamps_both_timestamps() {
        let at = Utc::now();
        let record = TimbreRecord::from_upsert(VoiceId::from("t-1"), &sample_upsert(), at);
        assert_eq!(record.created_at, at);
        assert_eq!(record.updated_at, at);
        assert_eq!(record.name, "Luna");
        assert_eq!(record.sort, 5);
    }

    #[test]
    fn test_details_projection_drops_timestamps() {
        let record = TimbreRecord::from_upsert(VoiceId::from("t-1"), &sample_upsert(), Utc::now());
        let details = record.details();
        assert_eq!(details.id, record.id);
        assert_eq!(details.voice_code, record.voice_code);

        let json = serde_json::to_value(&details).unwrap();
        assert!(json.get("createdAt").is_none());
        assert_eq!(json["ttsModelId"], "tts-edge");
    }

    #[test]
    fn test_filter_builder() {
        let filter = TimbreFilter::for_model("tts-edge").with_name_like("Lu");
        assert_eq!(filter.tts_model_id, "tts-edge");
        assert_eq!(filter.name_like.as_deref(), Some("Lu"));
    }
}
