//! Auto-clock-out notifications to the employee and their manager.

use std::sync::Arc;

use geoclock_core::clockout::AutoClockOut;
use geoclock_core::employee::Employee;
use geoclock_store::registry::DatabaseRegistry;

use crate::telegram::ChatTransport;

/// A successfully applied automatic clock-out, ready for notification.
pub struct AutoClockOutResult {
    pub employee: Employee,
    pub project_name: String,
    /// Human-readable reason from the validator verdict.
    pub reason: String,
    pub applied: AutoClockOut,
}

pub struct Notifier {
    transport: Arc<dyn ChatTransport>,
    databases: Arc<DatabaseRegistry>,
}

impl Notifier {
    pub fn new(transport: Arc<dyn ChatTransport>, databases: Arc<DatabaseRegistry>) -> Self {
        Notifier {
            transport,
            databases,
        }
    }

    /// Notify the employee and, when resolvable, their manager. Delivery
    /// failures are logged and never retried.
    pub async fn notify_auto_clock_out(&self, result: &AutoClockOutResult) {
        let employee = &result.employee;

        if let Some(chat_id) = &employee.telegram_chat_id {
            let text = format!(
                "⚠️ You have been automatically clocked out because {}.",
                result.reason
            );
            if let Err(e) = self.transport.send_text(chat_id, &text).await {
                tracing::warn!(
                    uid = %employee.uid,
                    error = %e,
                    "Failed to notify employee of auto clock-out"
                );
            }
        }

        let Some(manager_uid) = &employee.reporting_line_manager else {
            return;
        };
        match self.resolve_manager_chat(manager_uid, &result.project_name).await {
            Some(manager_chat) => {
                let text = format!(
                    "👤 Employee {} has been automatically clocked out due to {}.",
                    employee.name, result.reason
                );
                if let Err(e) = self.transport.send_text(&manager_chat, &text).await {
                    tracing::warn!(
                        manager_uid = %manager_uid,
                        error = %e,
                        "Failed to notify manager of auto clock-out"
                    );
                }
            }
            None => {
                tracing::debug!(
                    manager_uid = %manager_uid,
                    "Manager has no chat id, skipping manager notification"
                );
            }
        }
    }

    /// The manager's chat id, looked up in the employee's own project
    /// database.
    async fn resolve_manager_chat(&self, manager_uid: &str, project_name: &str) -> Option<String> {
        let db = self.databases.get(project_name)?;
        match db.get_employee_by_uid(manager_uid).await {
            Ok(Some(manager)) => manager.telegram_chat_id,
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(
                    manager_uid = %manager_uid,
                    error = %e,
                    "Manager lookup failed"
                );
                None
            }
        }
    }
}
