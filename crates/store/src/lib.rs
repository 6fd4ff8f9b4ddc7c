//! Document-store seam for the geoclock services.
//!
//! [`Database`] is the typed contract a backing store implements, one
//! instance per logical database (addressed by project name). The retry
//! wrapper and the health-aware [`registry::DatabaseRegistry`] sit on
//! top; [`memory::MemoryDatabase`] is a complete in-process
//! implementation used by tests and local runs.

pub mod error;
pub mod memory;
pub mod registry;
pub mod retry;

use async_trait::async_trait;

use geoclock_core::attendance::AttendanceDoc;
use geoclock_core::employee::Employee;
use geoclock_core::location::{CurrentLocation, LocationLogEntry};
use geoclock_core::Timestamp;

pub use error::{StoreError, StoreResult};

/// One logical document database.
///
/// All operations are async and may suspend on I/O. Implementations are
/// shared behind `Arc<dyn Database>`.
#[async_trait]
pub trait Database: Send + Sync {
    /// Name of the project this database belongs to; used to scope
    /// error labels and to route writes back to the right store.
    fn project_name(&self) -> &str;

    /// Cheap liveness probe, consulted before each monitor tick and
    /// ingestion event. Not retried.
    async fn ping(&self) -> StoreResult<()>;

    /// Find the employee whose `telegramChatID` matches, if any.
    async fn find_employee_by_chat_id(&self, chat_id: &str) -> StoreResult<Option<Employee>>;

    async fn get_employee_by_uid(&self, uid: &str) -> StoreResult<Option<Employee>>;

    /// Overwrite the employee's `currentLocation` and `lastChanged` in a
    /// single document update.
    async fn update_current_location(
        &self,
        employee_id: &str,
        location: &CurrentLocation,
        last_changed: Timestamp,
    ) -> StoreResult<()>;

    /// Mark the employee's current location as no longer live: clears
    /// `isLive`, stamps `endedAt` and `lastChanged`.
    async fn finalize_live_location(
        &self,
        employee_id: &str,
        ended_at: Timestamp,
    ) -> StoreResult<()>;

    /// Append one record to the employee's `locationLogs` subcollection.
    async fn append_location_log(
        &self,
        employee_id: &str,
        entry: &LocationLogEntry,
    ) -> StoreResult<()>;

    /// All attendance documents for the given UTC year and English month
    /// name. Clocked-in filtering happens client-side.
    async fn list_month_attendance(
        &self,
        year: i32,
        month: &str,
    ) -> StoreResult<Vec<AttendanceDoc>>;

    /// Persist a mutated attendance document as one update.
    async fn update_attendance(&self, doc: &AttendanceDoc) -> StoreResult<()>;
}
