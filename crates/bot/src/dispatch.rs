//! Routes inbound Telegram updates to ingestion and command handling.

use std::sync::Arc;

use crate::commands::CommandHandler;
use crate::ingest::LocationIngestor;
use crate::telegram::types::Update;

pub struct UpdateDispatcher {
    ingestor: Arc<LocationIngestor>,
    commands: Arc<CommandHandler>,
}

impl UpdateDispatcher {
    pub fn new(ingestor: Arc<LocationIngestor>, commands: Arc<CommandHandler>) -> Self {
        UpdateDispatcher { ingestor, commands }
    }

    /// Dispatch one update. `message` carries initial shares and text
    /// commands; `edited_message` carries live-location updates.
    pub async fn dispatch(&self, update: Update) {
        if let Some(message) = update.message {
            if let Some(location) = &message.location {
                self.ingestor
                    .on_location_event(
                        message.chat.id,
                        message.message_id,
                        location,
                        message.effective_live_period(),
                        false,
                    )
                    .await;
            } else if let Some(text) = &message.text {
                if text.starts_with('/') {
                    self.commands.handle(message.chat.id, text).await;
                }
            }
        } else if let Some(message) = update.edited_message {
            if let Some(location) = &message.location {
                self.ingestor
                    .on_location_event(
                        message.chat.id,
                        message.message_id,
                        location,
                        message.effective_live_period(),
                        true,
                    )
                    .await;
            }
        }
    }
}
