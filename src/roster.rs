//! Fan-out of reconciliations over the tracked roster.
//!
//! Each reconciliation runs on the blocking pool inside its own spawned
//! task, gated by a semaphore. Tasks are detached from the caller: if the
//! request that started them goes away they still finish and persist.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::{AggregateCache, Reconciliation};
use crate::error::AppError;

pub struct RosterReconciler {
    cache: Arc<AggregateCache>,
    roster: Vec<String>,
    permits: Arc<Semaphore>,
}

impl RosterReconciler {
    pub fn new(cache: Arc<AggregateCache>, roster: Vec<String>, max_concurrent: usize) -> Self {
        Self {
            cache,
            roster,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.roster.iter().any(|id| id == player_id)
    }

    fn spawn(&self, player_id: String) -> JoinHandle<Result<Reconciliation, AppError>> {
        let cache = Arc::clone(&self.cache);
        let permits = Arc::clone(&self.permits);

        tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| AppError::WorkerFailed(e.to_string()))?;
            tokio::task::spawn_blocking(move || cache.reconcile(&player_id))
                .await
                .map_err(|e| AppError::WorkerFailed(e.to_string()))
        })
    }

    async fn join(handle: JoinHandle<Result<Reconciliation, AppError>>) -> Result<Reconciliation, AppError> {
        match handle.await {
            Ok(result) => result,
            Err(e) => Err(AppError::WorkerFailed(e.to_string())),
        }
    }

    pub async fn reconcile_one(&self, player_id: &str) -> Result<Reconciliation, AppError> {
        Self::join(self.spawn(player_id.to_string())).await
    }

    /// Reconciles every tracked player. Results come back in roster order.
    pub async fn reconcile_all(&self) -> Vec<Result<Reconciliation, AppError>> {
        let handles: Vec<_> = self
            .roster
            .iter()
            .map(|player_id| self.spawn(player_id.clone()))
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(Self::join(handle).await);
        }

        let stale = results
            .iter()
            .filter(|r| r.as_ref().map(|rec| rec.is_stale()).unwrap_or(true))
            .count();
        info!("Reconciled {} players ({} with warnings)", results.len(), stale);
        results
    }
}
