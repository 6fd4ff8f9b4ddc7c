//! Employee document model (the subset the enforcement core reads).

use serde::{Deserialize, Serialize};

use crate::location::CurrentLocation;
use crate::types::Timestamp;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Document key.
    pub id: String,
    pub uid: String,
    #[serde(default)]
    pub name: String,
    /// The store spells this field with a capital `ID`.
    #[serde(default, rename = "telegramChatID")]
    pub telegram_chat_id: Option<String>,
    /// JSON-encoded multi-polygon; may be empty when no area is assigned.
    #[serde(default)]
    pub working_area: String,
    /// IANA zone name; falls back to the configured default when absent.
    #[serde(default)]
    pub timezone: Option<String>,
    /// Uid of the reporting line manager, if any.
    #[serde(default)]
    pub reporting_line_manager: Option<String>,
    #[serde(default)]
    pub current_location: Option<CurrentLocation>,
    #[serde(default)]
    pub last_changed: Option<Timestamp>,
}
