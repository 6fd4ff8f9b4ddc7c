//! Chat-to-employee session map.
//!
//! Populated by the phone-linking flow (and opportunistically by
//! ingestion after a successful database lookup); the enforcement core
//! only reads it. Thread-safe behind an interior `RwLock`; designed to
//! be wrapped in `Arc` and shared.

use std::collections::HashMap;

use tokio::sync::RwLock;

/// Where a chat's employee lives.
#[derive(Debug, Clone)]
pub struct EmployeeRef {
    pub project_name: String,
    /// Employee document key.
    pub employee_id: String,
    pub uid: String,
}

pub struct ChatSessions {
    sessions: RwLock<HashMap<i64, EmployeeRef>>,
}

impl ChatSessions {
    pub fn new() -> Self {
        ChatSessions {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, chat_id: i64) -> Option<EmployeeRef> {
        self.sessions.read().await.get(&chat_id).cloned()
    }

    pub async fn insert(&self, chat_id: i64, employee: EmployeeRef) {
        self.sessions.write().await.insert(chat_id, employee);
    }

    pub async fn remove(&self, chat_id: i64) {
        self.sessions.write().await.remove(&chat_id);
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for ChatSessions {
    fn default() -> Self {
        Self::new()
    }
}
