//! Finds every currently clocked-in employee across databases.

use std::sync::Arc;

use chrono::Datelike;

use geoclock_core::attendance::{month_name, AttendanceDoc};
use geoclock_core::employee::Employee;
use geoclock_core::Timestamp;
use geoclock_store::{retry, Database};

/// One clocked-in employee joined with their attendance document.
pub struct ClockedInEmployee {
    pub employee: Employee,
    pub attendance: AttendanceDoc,
    pub project_name: String,
}

/// Scan the given (healthy) databases for clocked-in employees in the
/// current UTC month.
///
/// Attendance is fetched per `(year, month)` and filtered client-side on
/// `lastClockInTimestamp`: a server-side filter would need a composite
/// index on every database, and monthly rows are bounded by headcount.
pub async fn scan_clocked_in(
    databases: &[Arc<dyn Database>],
    now: Timestamp,
) -> Vec<ClockedInEmployee> {
    let year = now.year();
    let month = month_name(now.month());

    let mut found = Vec::new();

    for db in databases {
        let docs = match retry::with_retry(db.project_name(), "list_month_attendance", || {
            db.list_month_attendance(year, month)
        })
        .await
        {
            Ok(docs) => docs,
            Err(e) => {
                tracing::error!(
                    project = db.project_name(),
                    error = %e,
                    "Failed to list month attendance"
                );
                continue;
            }
        };

        for attendance in docs
            .into_iter()
            .filter(|doc| doc.last_clock_in_timestamp.is_some())
        {
            match db.get_employee_by_uid(&attendance.uid).await {
                Ok(Some(employee)) => found.push(ClockedInEmployee {
                    employee,
                    attendance,
                    project_name: db.project_name().to_string(),
                }),
                Ok(None) => {
                    tracing::warn!(
                        project = db.project_name(),
                        uid = %attendance.uid,
                        "Clocked-in attendance has no matching employee"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        project = db.project_name(),
                        uid = %attendance.uid,
                        error = %e,
                        "Employee lookup failed during scan"
                    );
                }
            }
        }
    }

    found
}
