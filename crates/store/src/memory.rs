//! In-memory [`Database`] implementation.
//!
//! Documents are held as raw `serde_json::Value`s so the same
//! (de)serialization paths run as against a real document store, in
//! particular the attendance `values` normalization. Tests can seed raw
//! documents, flip health, and inject write failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use geoclock_core::attendance::AttendanceDoc;
use geoclock_core::employee::Employee;
use geoclock_core::location::{CurrentLocation, LocationLogEntry};
use geoclock_core::Timestamp;

use crate::error::{StoreError, StoreResult};
use crate::Database;

pub struct MemoryDatabase {
    project: String,
    employees: Mutex<HashMap<String, Value>>,
    location_logs: Mutex<HashMap<String, Vec<Value>>>,
    attendance: Mutex<HashMap<String, Value>>,
    healthy: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryDatabase {
    pub fn new(project: impl Into<String>) -> Self {
        MemoryDatabase {
            project: project.into(),
            employees: Mutex::new(HashMap::new()),
            location_logs: Mutex::new(HashMap::new()),
            attendance: Mutex::new(HashMap::new()),
            healthy: AtomicBool::new(true),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// When set, every write operation fails with [`StoreError::Write`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn insert_employee(&self, employee: &Employee) -> StoreResult<()> {
        let doc = to_value(employee)?;
        self.employees.lock().await.insert(employee.id.clone(), doc);
        Ok(())
    }

    pub async fn insert_attendance(&self, doc: &AttendanceDoc) -> StoreResult<()> {
        let value = to_value(doc)?;
        self.attendance.lock().await.insert(doc.id.clone(), value);
        Ok(())
    }

    /// Seed a raw attendance document, bypassing the typed model. Lets
    /// tests store the sparse map-shaped `values` a real store may hold.
    pub async fn insert_attendance_raw(&self, id: impl Into<String>, doc: Value) {
        self.attendance.lock().await.insert(id.into(), doc);
    }

    pub async fn employee(&self, id: &str) -> Option<Employee> {
        let docs = self.employees.lock().await;
        docs.get(id)
            .and_then(|doc| serde_json::from_value(doc.clone()).ok())
    }

    pub async fn attendance(&self, id: &str) -> Option<AttendanceDoc> {
        let docs = self.attendance.lock().await;
        docs.get(id)
            .and_then(|doc| serde_json::from_value(doc.clone()).ok())
    }

    /// The attendance document exactly as last written.
    pub async fn attendance_raw(&self, id: &str) -> Option<Value> {
        self.attendance.lock().await.get(id).cloned()
    }

    pub async fn location_logs(&self, employee_id: &str) -> Vec<Value> {
        self.location_logs
            .lock()
            .await
            .get(employee_id)
            .cloned()
            .unwrap_or_default()
    }

    fn write_guard(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::Write(format!(
                "injected write failure ({})",
                self.project
            )))
        } else {
            Ok(())
        }
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> StoreResult<Value> {
    serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[async_trait]
impl Database for MemoryDatabase {
    fn project_name(&self) -> &str {
        &self.project
    }

    async fn ping(&self) -> StoreResult<()> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable(format!(
                "{} is marked unhealthy",
                self.project
            )))
        }
    }

    async fn find_employee_by_chat_id(&self, chat_id: &str) -> StoreResult<Option<Employee>> {
        let docs = self.employees.lock().await;
        for doc in docs.values() {
            if doc.get("telegramChatID").and_then(Value::as_str) == Some(chat_id) {
                let employee = serde_json::from_value(doc.clone())
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                return Ok(Some(employee));
            }
        }
        Ok(None)
    }

    async fn get_employee_by_uid(&self, uid: &str) -> StoreResult<Option<Employee>> {
        let docs = self.employees.lock().await;
        for doc in docs.values() {
            if doc.get("uid").and_then(Value::as_str) == Some(uid) {
                let employee = serde_json::from_value(doc.clone())
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                return Ok(Some(employee));
            }
        }
        Ok(None)
    }

    async fn update_current_location(
        &self,
        employee_id: &str,
        location: &CurrentLocation,
        last_changed: Timestamp,
    ) -> StoreResult<()> {
        self.write_guard()?;
        let mut docs = self.employees.lock().await;
        let doc = docs.get_mut(employee_id).ok_or_else(|| StoreError::NotFound {
            collection: "employee",
            id: employee_id.to_string(),
        })?;
        doc["currentLocation"] = to_value(location)?;
        doc["lastChanged"] = to_value(&last_changed)?;
        Ok(())
    }

    async fn finalize_live_location(
        &self,
        employee_id: &str,
        ended_at: Timestamp,
    ) -> StoreResult<()> {
        self.write_guard()?;
        let mut docs = self.employees.lock().await;
        let doc = docs.get_mut(employee_id).ok_or_else(|| StoreError::NotFound {
            collection: "employee",
            id: employee_id.to_string(),
        })?;
        if let Some(location) = doc.get_mut("currentLocation") {
            if !location.is_null() {
                location["isLive"] = Value::Bool(false);
                location["endedAt"] = to_value(&ended_at)?;
                doc["lastChanged"] = to_value(&ended_at)?;
            }
        }
        Ok(())
    }

    async fn append_location_log(
        &self,
        employee_id: &str,
        entry: &LocationLogEntry,
    ) -> StoreResult<()> {
        self.write_guard()?;
        let record = to_value(entry)?;
        self.location_logs
            .lock()
            .await
            .entry(employee_id.to_string())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn list_month_attendance(
        &self,
        year: i32,
        month: &str,
    ) -> StoreResult<Vec<AttendanceDoc>> {
        let docs = self.attendance.lock().await;
        let mut out = Vec::new();
        for doc in docs.values() {
            let doc_year = doc.get("year").and_then(Value::as_i64);
            let doc_month = doc.get("month").and_then(Value::as_str);
            if doc_year == Some(year as i64) && doc_month == Some(month) {
                let parsed = serde_json::from_value(doc.clone())
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                out.push(parsed);
            }
        }
        Ok(out)
    }

    async fn update_attendance(&self, doc: &AttendanceDoc) -> StoreResult<()> {
        self.write_guard()?;
        let value = to_value(doc)?;
        self.attendance.lock().await.insert(doc.id.clone(), value);
        Ok(())
    }
}
