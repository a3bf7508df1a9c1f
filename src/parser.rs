// 🏗️ Payload Normalizer - Export JSON → canonical user list
//
// Exports arrive in several shapes for the same logical data. Each role has
// an explicit, ordered list of probes; the first probe that finds an array
// of entries wins. Anything unrecognized degrades to an empty list.

use crate::error::{AnalysisError, InputFile};
use crate::model::User;
use serde_json::Value;
use tracing::debug;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Which export a payload is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Followers,
    Following,
}

impl Role {
    pub fn name(&self) -> &str {
        match self {
            Role::Followers => "followers",
            Role::Following => "following",
        }
    }

    /// Probe order for this role, highest priority first
    pub fn probes(&self) -> &'static [Probe] {
        match self {
            Role::Followers => &[
                Probe::RootArray,
                Probe::Key("followers"),
                Probe::Key("relationships_followers"),
                Probe::FirstKey,
            ],
            Role::Following => &[
                Probe::Key("relationships_following"),
                Probe::RootArray,
                Probe::FirstArrayValue,
            ],
        }
    }
}

/// One way of locating the entry array inside a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Payload itself is the entry array
    RootArray,
    /// Object holds the entry array under this exact key
    Key(&'static str),
    /// Value of the first key in document order, if that value is an array
    FirstKey,
    /// First value in document order that is an array
    FirstArrayValue,
}

impl Probe {
    fn locate<'a>(&self, payload: &'a Value) -> Option<&'a [Value]> {
        match (self, payload) {
            (Probe::RootArray, Value::Array(entries)) => Some(entries),
            (Probe::Key(key), Value::Object(map)) => map.get(*key)?.as_array().map(Vec::as_slice),
            (Probe::FirstKey, Value::Object(map)) => {
                map.values().next()?.as_array().map(Vec::as_slice)
            }
            (Probe::FirstArrayValue, Value::Object(map)) => {
                map.values().find_map(|v| v.as_array().map(Vec::as_slice))
            }
            _ => None,
        }
    }
}

/// Result of shape detection
#[derive(Debug, Clone, PartialEq)]
pub enum ExportShape<'a> {
    /// Entry array found by the given probe
    Entries { probe: Probe, entries: &'a [Value] },
    Unrecognized,
}

// ============================================================================
// SHAPE DETECTION
// ============================================================================

/// Run the role's probes in priority order
pub fn detect_shape(payload: &Value, role: Role) -> ExportShape<'_> {
    role.probes()
        .iter()
        .find_map(|probe| {
            probe
                .locate(payload)
                .map(|entries| ExportShape::Entries { probe: *probe, entries })
        })
        .unwrap_or(ExportShape::Unrecognized)
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Convert a decoded export into a canonical user sequence
///
/// Never fails: an unrecognized shape yields an empty list, and the caller
/// decides whether emptiness is an error.
pub fn normalize(payload: &Value, role: Role) -> Vec<User> {
    match detect_shape(payload, role) {
        ExportShape::Entries { probe, entries } => {
            let users = flatten_entries(entries);
            debug!(
                role = role.name(),
                probe = ?probe,
                entries = entries.len(),
                users = users.len(),
                "normalized export"
            );
            users
        }
        ExportShape::Unrecognized => {
            debug!(role = role.name(), "no recognizable user list in export");
            Vec::new()
        }
    }
}

pub fn parse_followers_file(payload: &Value) -> Vec<User> {
    normalize(payload, Role::Followers)
}

pub fn parse_following_file(payload: &Value) -> Vec<User> {
    normalize(payload, Role::Following)
}

/// Flatten every entry's `string_list_data` into one ordered list
fn flatten_entries(entries: &[Value]) -> Vec<User> {
    entries
        .iter()
        .filter_map(|entry| entry.get("string_list_data")?.as_array())
        .flatten()
        .filter_map(record_to_user)
        .collect()
}

/// `value` → username (required), `href` → profile_url, `timestamp` → captured_at
fn record_to_user(record: &Value) -> Option<User> {
    let username = record.get("value")?.as_str()?;

    let mut user = User::new(username);
    if let Some(href) = record.get("href").and_then(Value::as_str) {
        user = user.with_profile_url(href);
    }
    if let Some(ts) = record.get("timestamp").and_then(timestamp_of) {
        user = user.with_captured_at(ts);
    }

    Some(user)
}

fn timestamp_of(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

// ============================================================================
// DECODING
// ============================================================================

/// Decode raw file content, tagging failures with the file they came from
pub fn decode_payload(raw: &str, file: InputFile) -> Result<Value, AnalysisError> {
    serde_json::from_str(raw).map_err(|e| AnalysisError::UnparseableContent {
        file,
        reason: e.to_string(),
    })
}

// ============================================================================
// TESTS
// ============================================================================
