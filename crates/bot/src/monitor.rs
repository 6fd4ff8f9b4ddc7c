//! Periodic geofence enforcement over all clocked-in employees.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use geoclock_core::clockout::{auto_clock_out, last_clock_out};
use geoclock_core::timefmt;
use geoclock_core::validator::validate;
use geoclock_core::{CoreError, Timestamp};
use geoclock_store::registry::DatabaseRegistry;
use geoclock_store::{retry, StoreError};

use crate::notify::{AutoClockOutResult, Notifier};
use crate::scanner::{self, ClockedInEmployee};

/// Pause before the first tick after `start`.
const WARMUP: Duration = Duration::from_secs(30);

/// Compiled-in monitoring policy.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub check_interval_minutes: i64,
    pub max_location_age_minutes: i64,
    pub enabled: bool,
    pub notifications_enabled: bool,
    /// IANA zone applied to displayed hours when an employee has none.
    pub default_timezone: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            check_interval_minutes: 5,
            max_location_age_minutes: 10,
            enabled: true,
            notifications_enabled: true,
            default_timezone: "Africa/Nairobi".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No database handle for project '{0}'")]
    UnknownProject(String),
}

/// The auto-clock-out control loop.
///
/// `start` is idempotent: a running monitor is left alone. `stop`
/// cancels the timer but lets an in-flight tick run to completion.
pub struct LocationMonitor {
    config: MonitorConfig,
    databases: Arc<DatabaseRegistry>,
    notifier: Arc<Notifier>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl LocationMonitor {
    pub fn new(
        config: MonitorConfig,
        databases: Arc<DatabaseRegistry>,
        notifier: Arc<Notifier>,
    ) -> Self {
        LocationMonitor {
            config,
            databases,
            notifier,
            cancel: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub async fn is_running(&self) -> bool {
        self.cancel.lock().await.is_some()
    }

    /// Schedule the first tick after a warm-up pause, then tick at the
    /// configured interval.
    pub async fn start(self: &Arc<Self>) {
        if !self.config.enabled {
            tracing::info!("Location monitoring is disabled");
            return;
        }

        let mut guard = self.cancel.lock().await;
        if guard.is_some() {
            tracing::debug!("Location monitor already running");
            return;
        }

        let cancel = CancellationToken::new();
        *guard = Some(cancel.clone());
        drop(guard);

        tracing::info!(
            check_interval_minutes = self.config.check_interval_minutes,
            max_location_age_minutes = self.config.max_location_age_minutes,
            "Location monitor starting"
        );

        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(WARMUP) => {}
            }

            let period = Duration::from_secs(monitor.config.check_interval_minutes as u64 * 60);
            let mut interval = tokio::time::interval(period);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("Location monitor stopping");
                        break;
                    }
                    _ = interval.tick() => {
                        monitor.tick(Utc::now()).await;
                    }
                }
            }
        });
    }

    /// Cancel the timer. Safe to call when already stopped.
    pub async fn stop(&self) {
        if let Some(cancel) = self.cancel.lock().await.take() {
            cancel.cancel();
            tracing::info!("Location monitor stop requested");
        }
    }

    /// Run one enforcement pass. Returns the applied clock-outs.
    ///
    /// Per-employee failures are logged and do not abort the tick.
    pub async fn tick(&self, now: Timestamp) -> Vec<AutoClockOutResult> {
        let healthy = self.databases.healthy().await;
        if healthy.is_empty() {
            tracing::warn!("No healthy databases, skipping monitor tick");
            return Vec::new();
        }

        let clocked_in = scanner::scan_clocked_in(&healthy, now).await;
        tracing::debug!(count = clocked_in.len(), "Monitor tick scanned clocked-in employees");

        let mut results = Vec::new();
        for item in clocked_in {
            match self.check_employee(&item, now).await {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(
                        uid = %item.employee.uid,
                        project = %item.project_name,
                        error = %e,
                        "Auto-clock-out check failed"
                    );
                }
            }
        }

        if self.config.notifications_enabled {
            for result in &results {
                self.notifier.notify_auto_clock_out(result).await;
            }
        } else if !results.is_empty() {
            tracing::debug!(
                count = results.len(),
                "Notifications disabled, suppressing auto-clock-out messages"
            );
        }

        if !results.is_empty() {
            tracing::info!(count = results.len(), "Monitor tick applied auto clock-outs");
        }
        results
    }

    async fn check_employee(
        &self,
        item: &ClockedInEmployee,
        now: Timestamp,
    ) -> Result<Option<AutoClockOutResult>, MonitorError> {
        let employee = &item.employee;

        if employee.working_area.trim().is_empty() {
            tracing::debug!(uid = %employee.uid, "No working area assigned, skipping");
            return Ok(None);
        }

        let verdict = validate(
            employee.current_location.as_ref(),
            &employee.working_area,
            self.config.max_location_age_minutes,
            now,
        );
        if verdict.is_valid {
            return Ok(None);
        }
        let Some(error) = verdict.error else {
            return Ok(None);
        };
        if !error.kind.is_actionable() {
            tracing::debug!(
                uid = %employee.uid,
                kind = %error.kind,
                "Verdict not actionable, skipping"
            );
            return Ok(None);
        }

        let Some(clock_in) = item.attendance.last_clock_in_timestamp else {
            return Ok(None);
        };

        // One clock-out per check interval: if the clock-in day already
        // carries a recent Clock-Out, let it stand.
        let day_index = (clock_in.day() - 1) as usize;
        if let Some(previous) = last_clock_out(&item.attendance, day_index) {
            if (now - previous).num_minutes() < self.config.check_interval_minutes {
                tracing::debug!(uid = %employee.uid, "Recent clock-out found, deduplicating");
                return Ok(None);
            }
        }

        let mut attendance = item.attendance.clone();
        let tz = timefmt::resolve_timezone(
            employee
                .timezone
                .as_deref()
                .or(Some(self.config.default_timezone.as_str())),
        );
        let applied = auto_clock_out(&mut attendance, now, tz)?;

        let db = self
            .databases
            .get(&item.project_name)
            .ok_or_else(|| MonitorError::UnknownProject(item.project_name.clone()))?;

        retry::with_retry(db.project_name(), "update_attendance", || {
            db.update_attendance(&attendance)
        })
        .await?;

        tracing::info!(
            uid = %employee.uid,
            project = %item.project_name,
            kind = %error.kind,
            hours_worked = applied.hours_worked,
            "Automatic clock-out applied"
        );

        Ok(Some(AutoClockOutResult {
            employee: employee.clone(),
            project_name: item.project_name.clone(),
            reason: error.message,
            applied,
        }))
    }
}
