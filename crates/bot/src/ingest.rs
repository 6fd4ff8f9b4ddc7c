//! Location ingestion: chat-transport events reduced into the employee
//! document and the append-only location log.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use geoclock_core::location::{CurrentLocation, LocationLogEntry, LocationSource};
use geoclock_store::registry::DatabaseRegistry;
use geoclock_store::retry;

use crate::live::LiveSessionRegistry;
use crate::sessions::{ChatSessions, EmployeeRef};
use crate::telegram::types::Location;

pub struct LocationIngestor {
    databases: Arc<DatabaseRegistry>,
    sessions: Arc<ChatSessions>,
    live: Arc<LiveSessionRegistry>,
}

impl LocationIngestor {
    pub fn new(
        databases: Arc<DatabaseRegistry>,
        sessions: Arc<ChatSessions>,
        live: Arc<LiveSessionRegistry>,
    ) -> Self {
        LocationIngestor {
            databases,
            sessions,
            live,
        }
    }

    /// Ingest one observed location event.
    ///
    /// Events for chats with no resolvable employee are dropped with a
    /// warning. The current-location write is the event's outcome; the
    /// log append afterwards is best-effort.
    pub async fn on_location_event(
        &self,
        chat_id: i64,
        message_id: i64,
        location: &Location,
        live_period_secs: Option<i64>,
        is_edit: bool,
    ) {
        let now = Utc::now();

        let Some(context) = self.resolve_context(chat_id).await else {
            tracing::warn!(chat_id, message_id, "Dropping location event for unknown chat");
            return;
        };

        let key = (chat_id, message_id);
        let is_live = self
            .live
            .observe(
                key,
                &context.employee_id,
                &context.project_name,
                live_period_secs,
                is_edit,
                now.timestamp_millis(),
            )
            .await;

        let live_until = if is_live {
            self.live
                .get(key)
                .await
                .and_then(|session| session.live_until_ms)
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        } else {
            None
        };

        let current = CurrentLocation {
            latitude: location.latitude,
            longitude: location.longitude,
            accuracy: location.horizontal_accuracy,
            heading: location.heading,
            speed: location.speed,
            source: if is_live {
                LocationSource::TelegramLive
            } else {
                LocationSource::Telegram
            },
            is_live,
            updated_at: now,
            live_message_id: message_id.to_string(),
            live_chat_id: chat_id.to_string(),
            live_until,
            ended_at: None,
        };

        let Some(db) = self.databases.get(&context.project_name) else {
            tracing::warn!(
                project = %context.project_name,
                chat_id,
                "No database handle for resolved employee context"
            );
            return;
        };

        let written = retry::with_retry(db.project_name(), "update_current_location", || {
            db.update_current_location(&context.employee_id, &current, now)
        })
        .await;

        if let Err(e) = written {
            tracing::error!(
                employee_id = %context.employee_id,
                error = %e,
                "Failed to write current location"
            );
            return;
        }

        let entry = LocationLogEntry {
            latitude: location.latitude,
            longitude: location.longitude,
            source: current.source,
            recorded_at: now,
            chat_id: chat_id.to_string(),
            message_id: message_id.to_string(),
            live_period_seconds: live_period_secs,
        };

        let logged = retry::with_retry(db.project_name(), "append_location_log", || {
            db.append_location_log(&context.employee_id, &entry)
        })
        .await;

        if let Err(e) = logged {
            tracing::warn!(
                employee_id = %context.employee_id,
                error = %e,
                "Failed to append location log"
            );
        }

        tracing::debug!(
            employee_id = %context.employee_id,
            chat_id,
            message_id,
            is_live,
            "Location event ingested"
        );
    }

    /// Resolve the employee behind a chat: session map first, then a
    /// `telegramChatID` lookup across healthy databases. Successful
    /// lookups are cached back into the session map.
    async fn resolve_context(&self, chat_id: i64) -> Option<EmployeeRef> {
        if let Some(context) = self.sessions.get(chat_id).await {
            return Some(context);
        }

        let chat = chat_id.to_string();
        for db in self.databases.healthy().await {
            match db.find_employee_by_chat_id(&chat).await {
                Ok(Some(employee)) => {
                    let context = EmployeeRef {
                        project_name: db.project_name().to_string(),
                        employee_id: employee.id.clone(),
                        uid: employee.uid.clone(),
                    };
                    self.sessions.insert(chat_id, context.clone()).await;
                    return Some(context);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        project = db.project_name(),
                        chat_id,
                        error = %e,
                        "Employee lookup by chat id failed"
                    );
                }
            }
        }
        None
    }
}
