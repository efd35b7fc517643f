use crate::config::Config;
use crate::datasource::{DecisionSink, ProductSnapshot, SnapshotSource, SourceError};
use crate::domain::ProductId;
use crate::engine::{RepriceOutcome, RepriceRequest, Repricer};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Counters for one scheduled run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub run_id: Uuid,
    pub products: usize,
    pub evaluated: usize,
    pub failed: usize,
    pub decisions: usize,
    pub changes: usize,
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Failed to list products: {0}")]
    Listing(#[from] SourceError),
}

/// Evaluates many products with a bounded number in flight.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    source: Arc<dyn SnapshotSource>,
    sink: Arc<dyn DecisionSink>,
    repricer: Repricer,
    config: Config,
}

enum ProductResult {
    Evaluated { decisions: usize, changes: usize },
    Failed,
}

impl BatchRunner {
    pub fn new(source: Arc<dyn SnapshotSource>, sink: Arc<dyn DecisionSink>, config: Config) -> Self {
        Self {
            source,
            sink,
            repricer: Repricer::new(config.engine_settings()),
            config,
        }
    }

    /// Evaluate every product the source lists.
    pub async fn run(&self, slow_cron: bool) -> Result<BatchSummary, BatchError> {
        let products = self.source.list_products().await?;
        Ok(self.run_products(products, slow_cron).await)
    }

    /// Evaluate the given products. Per-product failures are counted, not fatal.
    pub async fn run_products(&self, products: Vec<ProductId>, slow_cron: bool) -> BatchSummary {
        let run_id = Uuid::new_v4();
        let mut summary = BatchSummary {
            run_id,
            products: products.len(),
            ..Default::default()
        };

        info!(
            "Starting run {} over {} products (slow_cron={})",
            run_id,
            products.len(),
            slow_cron
        );

        let results: Vec<ProductResult> = stream::iter(products)
            .map(|product_id| self.run_product(run_id, product_id, slow_cron))
            .buffer_unordered(self.config.batch_concurrency.max(1))
            .collect()
            .await;

        for result in results {
            match result {
                ProductResult::Evaluated { decisions, changes } => {
                    summary.evaluated += 1;
                    summary.decisions += decisions;
                    summary.changes += changes;
                }
                ProductResult::Failed => summary.failed += 1,
            }
        }

        info!(
            "Run {} finished: {} evaluated, {} failed, {} decisions, {} changes",
            run_id, summary.evaluated, summary.failed, summary.decisions, summary.changes
        );
        summary
    }

    async fn run_product(&self, run_id: Uuid, product_id: ProductId, slow_cron: bool) -> ProductResult {
        let snapshot = match self.source.fetch_snapshot(product_id).await {
            Ok(s) => s,
            Err(e) => {
                warn!("Skipping product {}: {}", product_id, e);
                return ProductResult::Failed;
            }
        };

        let outcome = self.evaluate(snapshot, slow_cron);

        if let Err(e) = self.sink.record(run_id, &outcome).await {
            warn!("Failed to record decisions for product {}: {}", product_id, e);
            return ProductResult::Failed;
        }

        ProductResult::Evaluated {
            decisions: outcome.decisions.len(),
            changes: outcome.changes().count(),
        }
    }

    fn evaluate(&self, snapshot: ProductSnapshot, slow_cron: bool) -> RepriceOutcome {
        let context_url = snapshot
            .context_url
            .unwrap_or_else(|| self.config.context_url(snapshot.product_id));
        let request = RepriceRequest {
            product_id: snapshot.product_id,
            offers: snapshot.offers,
            active_vendors: snapshot.active_vendors,
            configs: snapshot.configs,
            slow_cron,
            context_url,
            evaluated_at: Utc::now(),
        };
        self.repricer.reprice(&request)
    }
}
