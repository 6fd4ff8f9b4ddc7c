//! Shared fixtures for the integration tests: a recording chat
//! transport and seed-data builders.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Datelike;
use tokio::sync::Mutex;

use geoclock_bot::telegram::{ChatTransport, TelegramError};
use geoclock_core::attendance::{month_name, AttendanceDoc, AttendanceValues};
use geoclock_core::employee::Employee;
use geoclock_core::location::{CurrentLocation, LocationSource};
use geoclock_core::Timestamp;
use geoclock_store::memory::MemoryDatabase;
use geoclock_store::registry::DatabaseRegistry;
use geoclock_store::Database;

/// Chat transport that records every send instead of hitting the
/// network.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingTransport {
    pub async fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), TelegramError> {
        self.sent
            .lock()
            .await
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn send_with_keyboard(
        &self,
        chat_id: &str,
        text: &str,
        _reply_markup: serde_json::Value,
    ) -> Result<(), TelegramError> {
        self.sent
            .lock()
            .await
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }
}

/// A square working area spanning `lon 36.80..36.82`, `lat -1.29..-1.27`.
pub const NAIROBI_SQUARE: &str =
    "[[[36.80,-1.29],[36.82,-1.29],[36.82,-1.27],[36.80,-1.27]]]";

pub fn registry_with(db: Arc<MemoryDatabase>) -> Arc<DatabaseRegistry> {
    Arc::new(DatabaseRegistry::new(vec![db as Arc<dyn Database>]))
}

pub fn employee(id: &str, uid: &str, chat_id: Option<&str>, working_area: &str) -> Employee {
    Employee {
        id: id.to_string(),
        uid: uid.to_string(),
        name: "Jane Wanjiku".to_string(),
        telegram_chat_id: chat_id.map(str::to_string),
        working_area: working_area.to_string(),
        timezone: None,
        reporting_line_manager: None,
        current_location: None,
        last_changed: None,
    }
}

pub fn live_location(longitude: f64, latitude: f64, updated_at: Timestamp) -> CurrentLocation {
    CurrentLocation {
        latitude,
        longitude,
        accuracy: Some(10.0),
        heading: None,
        speed: None,
        source: LocationSource::TelegramLive,
        is_live: true,
        updated_at,
        live_message_id: "42".to_string(),
        live_chat_id: "1001".to_string(),
        live_until: None,
        ended_at: None,
    }
}

/// An attendance document clocked in at `clock_in`, keyed to that
/// instant's UTC month.
pub fn attendance_clocked_in(id: &str, uid: &str, clock_in: Timestamp) -> AttendanceDoc {
    AttendanceDoc {
        id: id.to_string(),
        uid: uid.to_string(),
        year: clock_in.year(),
        month: month_name(clock_in.month()).to_string(),
        monthly_worked_hours: 0.0,
        last_clock_in_timestamp: Some(clock_in),
        last_changed: None,
        values: AttendanceValues::default(),
    }
}
