//! In-memory collaborators for tests and local runs.

use super::{DecisionSink, ProductSnapshot, SourceError, SnapshotSource};
use crate::domain::{Decision, ProductId};
use crate::engine::RepriceOutcome;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Snapshot source backed by a fixed set of snapshots.
#[derive(Debug, Clone, Default)]
pub struct MockSnapshotSource {
    snapshots: BTreeMap<ProductId, ProductSnapshot>,
    failing: BTreeMap<ProductId, SourceError>,
}

impl MockSnapshotSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(mut self, snapshot: ProductSnapshot) -> Self {
        self.snapshots.insert(snapshot.product_id, snapshot);
        self
    }

    /// Make fetching `product_id` fail with `error`; it is still listed.
    pub fn with_failure(mut self, product_id: ProductId, error: SourceError) -> Self {
        self.failing.insert(product_id, error);
        self
    }
}

#[async_trait]
impl SnapshotSource for MockSnapshotSource {
    async fn list_products(&self) -> Result<Vec<ProductId>, SourceError> {
        let mut ids: Vec<ProductId> = self.snapshots.keys().chain(self.failing.keys()).copied().collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn fetch_snapshot(&self, product_id: ProductId) -> Result<ProductSnapshot, SourceError> {
        if let Some(err) = self.failing.get(&product_id) {
            return Err(err.clone());
        }
        self.snapshots
            .get(&product_id)
            .cloned()
            .ok_or(SourceError::NotFound(product_id))
    }
}

/// Sink that keeps every recorded decision in memory.
///
/// A decision whose `decision_key` was already recorded under the same run is
/// dropped, the way the results log de-duplicates retried writes.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<(Uuid, Decision)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn decisions(&self) -> Vec<Decision> {
        self.records.lock().await.iter().map(|(_, d)| d.clone()).collect()
    }

    pub async fn run_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.records.lock().await.iter().map(|(id, _)| *id).collect();
        ids.dedup();
        ids
    }
}

#[async_trait]
impl DecisionSink for RecordingSink {
    async fn record(&self, run_id: Uuid, outcome: &RepriceOutcome) -> Result<(), SourceError> {
        let mut records = self.records.lock().await;
        for decision in &outcome.decisions {
            let key = decision.decision_key();
            let seen = records
                .iter()
                .any(|(id, d)| *id == run_id && d.decision_key() == key);
            if !seen {
                records.push((run_id, decision.clone()));
            }
        }
        Ok(())
    }
}
