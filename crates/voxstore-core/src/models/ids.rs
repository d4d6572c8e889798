//! Newtype identifiers - zero-cost type safety over raw ids

use rusqlite::types::{FromSql, FromSqlError, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

/// Opaque id of a voice.
///
/// Shared by timbre records and voice clones: both kinds of id flow through
/// the same name-lookup path and the same `timbre:name:{id}` cache
/// namespace, so they share one id type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceId(String);

impl VoiceId {
    /// Create a new VoiceId
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Mint a fresh id for an insert
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get reference to inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract inner String, consuming self
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Check if the id is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for VoiceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VoiceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for VoiceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for VoiceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for VoiceId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for VoiceId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl ToSql for VoiceId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for VoiceId {
    fn column_result(value: ValueRef<'_>) -> Result<Self, FromSqlError> {
        value.as_str().map(VoiceId::from)
    }
}

/// Id of the platform user who owns a voice clone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Create a new UserId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw id
    pub fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for UserId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for UserId {
    fn column_result(value: ValueRef<'_>) -> Result<Self, FromSqlError> {
        value.as_i64().map(UserId::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_id_generate_is_unique() {
        let a = VoiceId::generate();
        let b = VoiceId::generate();
        assert_ne!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_voice_id_string_comparisons() {
        let id = VoiceId::from("t-42");
        assert_eq!(id, "t-42");
        assert_eq!(id.as_str(), "t-42");
        assert_eq!(id.to_string(), "t-42");
        assert_eq!(id.into_inner(), "t-42");
    }

    #[test]
    fn test_user_id_roundtrip() {
        let user = UserId::new(1001);
        assert_eq!(user.value(), 1001);
        assert_eq!(user.to_string(), "1001");
    }
}
