//! Text command handlers: `/start`, `/test`, `/app`, `/location`,
//! `/live`.

use std::sync::Arc;

use chrono::Utc;

use geoclock_store::registry::DatabaseRegistry;

use crate::sessions::{ChatSessions, EmployeeRef};
use crate::telegram::ChatTransport;

pub struct CommandHandler {
    transport: Arc<dyn ChatTransport>,
    databases: Arc<DatabaseRegistry>,
    sessions: Arc<ChatSessions>,
    web_app_url: Option<String>,
}

impl CommandHandler {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        databases: Arc<DatabaseRegistry>,
        sessions: Arc<ChatSessions>,
        web_app_url: Option<String>,
    ) -> Self {
        CommandHandler {
            transport,
            databases,
            sessions,
            web_app_url,
        }
    }

    /// Route a text message starting with `/`. Unknown commands are
    /// ignored.
    pub async fn handle(&self, chat_id: i64, text: &str) {
        let command = text
            .split_whitespace()
            .next()
            .unwrap_or("")
            .split('@')
            .next()
            .unwrap_or("");

        let reply = match command {
            "/start" => self.start(chat_id).await,
            "/test" => "✅ The attendance bot is up and listening.".to_string(),
            "/app" => {
                self.app(chat_id).await;
                return;
            }
            "/location" => self.location(chat_id).await,
            "/live" => "📍 Open the attachment menu, choose <b>Location</b>, then \
                        <b>Share My Live Location</b>. Keep sharing for your whole shift \
                        so you stay clocked in."
                .to_string(),
            _ => return,
        };

        self.send(chat_id, &reply).await;
    }

    async fn start(&self, chat_id: i64) -> String {
        match self.resolve_employee(chat_id).await {
            Some((context, name)) => {
                self.sessions.insert(chat_id, context).await;
                format!(
                    "👋 Welcome back, <b>{name}</b>! Your phone is linked. \
                     Share your live location to stay clocked in."
                )
            }
            None => "👋 Welcome! This phone is not linked to an employee yet. \
                     Open the attendance app and link your Telegram account first."
                .to_string(),
        }
    }

    async fn app(&self, chat_id: i64) {
        match &self.web_app_url {
            Some(url) => {
                let keyboard = serde_json::json!({
                    "inline_keyboard": [[{"text": "Open attendance app", "url": url}]],
                });
                if let Err(e) = self
                    .transport
                    .send_with_keyboard(&chat_id.to_string(), "🕐 Open the attendance app:", keyboard)
                    .await
                {
                    tracing::warn!(chat_id, error = %e, "Failed to send app link");
                }
            }
            None => {
                self.send(chat_id, "The attendance app URL is not configured.")
                    .await;
            }
        }
    }

    async fn location(&self, chat_id: i64) -> String {
        let Some((context, _)) = self.resolve_employee(chat_id).await else {
            return "This phone is not linked to an employee.".to_string();
        };
        let Some(db) = self.databases.get(&context.project_name) else {
            return "Your project's database is currently unavailable.".to_string();
        };

        match db.get_employee_by_uid(&context.uid).await {
            Ok(Some(employee)) => match employee.current_location {
                Some(location) => {
                    let age_minutes = (Utc::now() - location.updated_at).num_minutes();
                    let live = if location.is_live { "live" } else { "static" };
                    format!(
                        "📍 Last known location: <b>{:.5}, {:.5}</b> ({live}, {age_minutes} min ago)",
                        location.latitude, location.longitude
                    )
                }
                None => "No location on record yet. Share your location to get started."
                    .to_string(),
            },
            Ok(None) => "Your employee record could not be found.".to_string(),
            Err(e) => {
                tracing::warn!(chat_id, error = %e, "Employee lookup failed for /location");
                "Could not read your location right now, try again shortly.".to_string()
            }
        }
    }

    async fn send(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.transport.send_text(&chat_id.to_string(), text).await {
            tracing::warn!(chat_id, error = %e, "Failed to send command reply");
        }
    }

    /// Session map first, then healthy-database lookup by chat id.
    async fn resolve_employee(&self, chat_id: i64) -> Option<(EmployeeRef, String)> {
        if let Some(context) = self.sessions.get(chat_id).await {
            let name = match self.databases.get(&context.project_name) {
                Some(db) => db
                    .get_employee_by_uid(&context.uid)
                    .await
                    .ok()
                    .flatten()
                    .map(|employee| employee.name)
                    .unwrap_or_default(),
                None => String::new(),
            };
            return Some((context, name));
        }

        let chat = chat_id.to_string();
        for db in self.databases.healthy().await {
            if let Ok(Some(employee)) = db.find_employee_by_chat_id(&chat).await {
                let context = EmployeeRef {
                    project_name: db.project_name().to_string(),
                    employee_id: employee.id.clone(),
                    uid: employee.uid.clone(),
                };
                return Some((context, employee.name));
            }
        }
        None
    }
}
