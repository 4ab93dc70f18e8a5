//! Best-effort audit trail in the `audit_logs` table.
//!
//! Writing an entry never fails the caller; a rejected insert is logged.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::backend::DataBackend;
use crate::repository::to_row;
use crate::types::AUDIT_LOGS_TABLE;

/// One audit row.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub action: String,
    pub entity_type: String,
    pub entity_ids: Vec<String>,
    pub success: usize,
    pub failed: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AuditLog {
    backend: Arc<dyn DataBackend>,
}

impl AuditLog {
    pub fn new(backend: Arc<dyn DataBackend>) -> Self {
        Self { backend }
    }

    pub async fn record(&self, entry: AuditEntry) {
        let row = match to_row(&entry) {
            Ok(row) => row,
            Err(e) => {
                warn!("Could not encode audit entry: {}", e);
                return;
            }
        };

        match self.backend.insert(AUDIT_LOGS_TABLE, row).await {
            Ok(_) => debug!(action = %entry.action, entity_type = %entry.entity_type, "Audit entry written"),
            Err(e) => warn!(action = %entry.action, "Audit entry not written: {}", e),
        }
    }
}
