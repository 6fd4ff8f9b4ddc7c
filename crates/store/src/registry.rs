//! Health-aware collection of database handles.

use std::sync::Arc;

use crate::Database;

/// The set of logical databases the services operate over.
///
/// Health is re-queried at the start of each monitor tick and each
/// ingestion event; callers work against the returned snapshot.
pub struct DatabaseRegistry {
    databases: Vec<Arc<dyn Database>>,
}

impl DatabaseRegistry {
    pub fn new(databases: Vec<Arc<dyn Database>>) -> Self {
        DatabaseRegistry { databases }
    }

    pub fn all(&self) -> &[Arc<dyn Database>] {
        &self.databases
    }

    /// Handle for a specific project, if registered.
    pub fn get(&self, project_name: &str) -> Option<Arc<dyn Database>> {
        self.databases
            .iter()
            .find(|db| db.project_name() == project_name)
            .cloned()
    }

    /// Ping every database and return the ones that answered. Failures
    /// are logged and the handle is skipped for this round.
    pub async fn healthy(&self) -> Vec<Arc<dyn Database>> {
        let mut healthy = Vec::with_capacity(self.databases.len());
        for db in &self.databases {
            match db.ping().await {
                Ok(()) => healthy.push(Arc::clone(db)),
                Err(e) => {
                    tracing::warn!(
                        project = db.project_name(),
                        error = %e,
                        "Database failed health check, skipping this round"
                    );
                }
            }
        }
        healthy
    }
}
