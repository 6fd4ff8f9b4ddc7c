//! Employee location state as reduced from chat-platform events.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Where a location reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    /// A static (one-shot) location share.
    Telegram,
    /// A reading from an active live-location stream.
    TelegramLive,
}

/// The single latest reduction of all observed location events for an
/// employee. Stored on the employee document as `currentLocation`.
///
/// Invariants: `is_live` implies `ended_at` is `None`; once `ended_at`
/// is set the session is finalized and is not revived by stale updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    pub source: LocationSource,
    pub is_live: bool,
    pub updated_at: Timestamp,
    /// Correlation ids for the live session this reading belongs to.
    pub live_message_id: String,
    pub live_chat_id: String,
    /// When live sharing is expected to end; `None` if unknown.
    #[serde(default)]
    pub live_until: Option<Timestamp>,
    /// When the session was finalized; `None` while active.
    #[serde(default)]
    pub ended_at: Option<Timestamp>,
}

/// One append-only record per observed location event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationLogEntry {
    pub latitude: f64,
    pub longitude: f64,
    pub source: LocationSource,
    /// Timestamp of the observed event.
    pub recorded_at: Timestamp,
    pub chat_id: String,
    pub message_id: String,
    #[serde(default)]
    pub live_period_seconds: Option<i64>,
}
