//! Inbound Telegram update payloads (the subset the bot consumes).

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    /// Initial location share (static or start of live), or a text
    /// message.
    #[serde(default)]
    pub message: Option<Message>,
    /// Updates to an in-progress live location.
    #[serde(default)]
    pub edited_message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
    /// Live-sharing duration in seconds. Telegram may put this at the
    /// message level, the location level, or omit it on updates.
    #[serde(default)]
    pub live_period: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub horizontal_accuracy: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub live_period: Option<i64>,
}

impl Message {
    /// The live period for this message, wherever Telegram put it.
    pub fn effective_live_period(&self) -> Option<i64> {
        self.live_period
            .or_else(|| self.location.as_ref().and_then(|location| location.live_period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_a_live_location_update() {
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 7,
                "edited_message": {
                    "message_id": 42,
                    "chat": {"id": 1001},
                    "location": {
                        "latitude": -1.29,
                        "longitude": 36.81,
                        "horizontal_accuracy": 14.2,
                        "live_period": 900
                    }
                }
            }"#,
        )
        .unwrap();

        let message = update.edited_message.unwrap();
        assert_eq!(message.chat.id, 1001);
        assert_eq!(message.effective_live_period(), Some(900));
        let location = message.location.unwrap();
        assert_eq!(location.horizontal_accuracy, Some(14.2));
        assert!(location.heading.is_none());
    }

    #[test]
    fn message_level_live_period_wins() {
        let message: Message = serde_json::from_str(
            r#"{
                "message_id": 1,
                "chat": {"id": 5},
                "live_period": 300,
                "location": {"latitude": 0.0, "longitude": 0.0}
            }"#,
        )
        .unwrap();
        assert_eq!(message.effective_live_period(), Some(300));
    }
}
