// src/fleet.rs - Bounded concurrent evaluation of many KPI requests
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::batch::KpiBatch;
use crate::engine::{KpiEngine, KpiReport, KpiRequest};
use crate::error::{KpiError, Result};
use crate::model::CanonicalDuration;
use crate::series::{point_requests, SeriesPoint};
use chrono::{DateTime, Utc};
use log::{debug, info};

/// Runs independent KPI requests on a bounded worker pool.
///
/// Each request is CPU-only work and runs on the blocking pool; a semaphore
/// caps how many run at once. The engine and the batch are shared read-only.
pub struct FleetEvaluator {
    engine: Arc<KpiEngine>,
    workers: usize,
}

impl FleetEvaluator {
    /// Pool sized from the engine configuration
    pub fn new(engine: KpiEngine) -> Self {
        let workers = engine.config().worker_count();
        Self {
            engine: Arc::new(engine),
            workers,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn engine(&self) -> &KpiEngine {
        &self.engine
    }

    /// One request per configured unit, all pinned to the same window end.
    ///
    /// A missing `end_time` reads the clock once for the whole fleet.
    pub fn fleet_requests(
        &self,
        duration: CanonicalDuration,
        end_time: Option<DateTime<Utc>>,
    ) -> Vec<KpiRequest> {
        let end = end_time.unwrap_or_else(Utc::now);
        self.engine
            .config()
            .units
            .keys()
            .map(|unit| KpiRequest::new(unit.clone(), duration).ending_at(end))
            .collect()
    }

    /// Evaluate all requests concurrently.
    ///
    /// Results come back in request order. A request that fails on its own
    /// input (an unknown unit, say) yields an `Err` in its slot; a worker
    /// that panics fails the whole call with [`KpiError::Runtime`].
    pub async fn evaluate_all(
        &self,
        requests: Vec<KpiRequest>,
        batch: Arc<KpiBatch>,
    ) -> Result<Vec<Result<KpiReport>>> {
        let total = requests.len();
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut join_set = JoinSet::new();

        debug!("Dispatching {} request(s) on {} worker(s)", total, self.workers);

        for (index, request) in requests.into_iter().enumerate() {
            let engine = Arc::clone(&self.engine);
            let batch = Arc::clone(&batch);
            let semaphore = Arc::clone(&semaphore);

            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| KpiError::Runtime(format!("Worker pool closed: {}", e)))?;

                let report = tokio::task::spawn_blocking(move || engine.evaluate(&request, &batch))
                    .await
                    .map_err(|e| KpiError::Runtime(format!("Join error: {}", e)))?;

                Ok::<_, KpiError>((index, report))
            });
        }

        let mut slots: Vec<Option<Result<KpiReport>>> = (0..total).map(|_| None).collect();

        while let Some(res) = join_set.join_next().await {
            match res {
                Ok(Ok((index, report))) => {
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(report);
                    }
                }
                Ok(Err(e)) => return Err(e),
                Err(e) => return Err(KpiError::Runtime(format!("Join error: {}", e))),
            }
        }

        let results = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| {
                    KpiError::Runtime(format!("request {} produced no result", index))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!("Evaluated {} request(s), {} failed", total, failed);
        Ok(results)
    }

    /// Evaluate every configured unit over the same window
    pub async fn evaluate_fleet(
        &self,
        duration: CanonicalDuration,
        end_time: Option<DateTime<Utc>>,
        batch: Arc<KpiBatch>,
    ) -> Result<Vec<Result<KpiReport>>> {
        let requests = self.fleet_requests(duration, end_time);
        self.evaluate_all(requests, batch).await
    }

    /// Evaluate every series point of `request` on the pool.
    ///
    /// Points come back oldest first. The first point that fails fails the series.
    pub async fn series(
        &self,
        request: &KpiRequest,
        batch: Arc<KpiBatch>,
    ) -> Result<Vec<SeriesPoint>> {
        let points = point_requests(request);
        debug!(
            "{} {}: {} series point(s) on the pool",
            request.unit,
            request.duration,
            points.len()
        );

        self.evaluate_all(points, batch)
            .await?
            .into_iter()
            .map(|report| Ok(SeriesPoint::from(&report?)))
            .collect()
    }
}
