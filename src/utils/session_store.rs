use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use tracing::info;
use uuid::Uuid;

use crate::controller::PayslipSession;
use crate::error::PayslipError;
use crate::model::table::EmployeeTable;

/// Live upload sessions, keyed by session id.
///
/// Entries expire after `idle` without access. Values are immutable; every
/// change is computed from the current entry and swapped in atomically, so a
/// closed session stays closed and a replaced table is never written back.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<Uuid, Arc<PayslipSession>>,
}

impl SessionStore {
    pub fn new(capacity: u64, idle: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(capacity)
                .time_to_idle(idle)
                .build(),
        }
    }

    /// Start a session around a freshly loaded table.
    pub async fn open(&self, table: EmployeeTable, source_name: Option<String>) -> Arc<PayslipSession> {
        let session = Arc::new(PayslipSession::open(table, source_name));
        self.sessions.insert(session.id, session.clone()).await;
        info!(session_id = %session.id, rows = session.table.len(), "Session opened");
        session
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<PayslipSession>> {
        self.sessions.get(id).await
    }

    /// Replace the session's table with a new upload. `None` if the session is gone.
    pub async fn replace_table(
        &self,
        id: &Uuid,
        table: EmployeeTable,
        source_name: Option<String>,
    ) -> Option<Arc<PayslipSession>> {
        let outcome = self
            .sessions
            .entry(*id)
            .and_compute_with(|current| async move {
                match current {
                    Some(entry) => Op::Put(Arc::new(entry.into_value().reload(table, source_name))),
                    None => Op::Nop,
                }
            })
            .await;

        match outcome {
            CompResult::ReplacedWith(entry) => {
                let next = entry.into_value();
                info!(session_id = %id, rows = next.table.len(), "Session table replaced");
                Some(next)
            }
            _ => None,
        }
    }

    /// Record a selection. Outer `None` means no such session.
    pub async fn select(
        &self,
        id: &Uuid,
        code: &str,
    ) -> Option<Result<Arc<PayslipSession>, PayslipError>> {
        let mut refused = None;
        let outcome = self
            .sessions
            .entry(*id)
            .and_compute_with(|current| {
                let op = match current.map(|entry| entry.value().select(code)) {
                    Some(Ok(next)) => Op::Put(Arc::new(next)),
                    Some(Err(e)) => {
                        refused = Some(e);
                        Op::Nop
                    }
                    None => Op::Nop,
                };
                async move { op }
            })
            .await;

        match (outcome, refused) {
            (_, Some(e)) => Some(Err(e)),
            (CompResult::ReplacedWith(entry), None) => Some(Ok(entry.into_value())),
            _ => None,
        }
    }

    /// Drop a session; returns whether one existed.
    pub async fn close(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).await.is_some()
    }
}
