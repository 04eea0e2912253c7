//! The background consumer that turns queued requests into statement files.
//!
//! One processor drains the queue in order. Every request is handled inside an
//! item boundary: whatever goes wrong while indexing, rendering or writing is
//! logged with the customer and invoice id and the loop moves on.

use crate::config::{DuplicatePlayPolicy, ProcessorConfig};
use crate::error::{StatementError, StatementResult};
use crate::generator::StatementGenerator;
use crate::invoice::{InvoiceRequest, Play, PlayIndex};
use crate::queue::InvoiceQueue;
use crate::sink::OutputSink;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Statistics about processed requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessorStats {
    /// Requests taken off the queue
    pub received: u64,
    /// Requests whose statement was written
    pub completed: u64,
    /// Requests that failed and produced no file
    pub failed: u64,
    /// Average processing time
    pub avg_duration: Option<Duration>,
}

/// Single consumer of an [`InvoiceQueue`]
pub struct QueueProcessor {
    queue: Arc<InvoiceQueue>,
    generator: Arc<dyn StatementGenerator>,
    sink: Arc<dyn OutputSink>,
    config: ProcessorConfig,
    stats: Arc<Mutex<ProcessorStats>>,
}

impl QueueProcessor {
    /// Create a processor over the given collaborators
    pub fn new(
        queue: Arc<InvoiceQueue>,
        generator: Arc<dyn StatementGenerator>,
        sink: Arc<dyn OutputSink>,
        config: ProcessorConfig,
        stats: Arc<Mutex<ProcessorStats>>,
    ) -> Self {
        Self {
            queue,
            generator,
            sink,
            config,
            stats,
        }
    }

    /// Consume the queue until it is closed and drained
    pub async fn run(self) {
        tracing::info!("Statement processor started");

        while let Some(request) = self.queue.dequeue().await {
            self.handle(request).await;
        }

        let stats = self.stats.lock().await;
        tracing::info!(
            "Statement processor stopped: {} completed, {} failed",
            stats.completed,
            stats.failed
        );
    }

    /// Process one request, logging instead of propagating any failure
    async fn handle(&self, request: InvoiceRequest) {
        let customer = request.customer().to_string();
        let invoice_id = request.invoice_id();

        let start_time = Instant::now();
        let result = AssertUnwindSafe(self.process(request))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(StatementError::panicked(payload.as_ref())));
        let duration = start_time.elapsed();

        match &result {
            Ok(path) => {
                tracing::info!(
                    customer = %customer,
                    invoice_id = %invoice_id,
                    path = %path.display(),
                    "Statement written in {:?}",
                    duration
                );
            }
            Err(error) => {
                tracing::error!(
                    customer = %customer,
                    invoice_id = %invoice_id,
                    error = %error,
                    "Failed to process statement"
                );
            }
        }

        self.update_stats(result.is_ok(), duration).await;
    }

    /// Index the plays, render the statement and write it under the customer name
    pub async fn process(&self, request: InvoiceRequest) -> StatementResult<PathBuf> {
        let index = self.build_index(&request.plays)?;
        let InvoiceRequest { invoice, .. } = request;

        let generator = Arc::clone(&self.generator);
        let (invoice, rendered) = tokio::task::spawn_blocking(move || {
            let rendered = generator.generate(&invoice, &index);
            (invoice, rendered)
        })
        .await
        .map_err(|join_error| StatementError::Generation {
            message: format!("statement generator panicked: {join_error}"),
            source: None,
        })?;

        let content = rendered.map_err(|e| {
            StatementError::generation(format!("could not render invoice {}", invoice.id), e)
        })?;

        self.sink.write(&invoice.customer, &content).await
    }

    fn build_index(&self, plays: &[Play]) -> StatementResult<PlayIndex> {
        let index = PlayIndex::build(plays);

        if let Some(&play_id) = index.duplicates().first() {
            match self.config.duplicate_plays {
                DuplicatePlayPolicy::Reject => {
                    return Err(StatementError::DuplicatePlay { play_id });
                }
                DuplicatePlayPolicy::LastWins => {
                    tracing::warn!(
                        "{} duplicate play id(s) in request, later entries kept: {:?}",
                        index.duplicates().len(),
                        index.duplicates()
                    );
                }
            }
        }

        Ok(index)
    }

    async fn update_stats(&self, succeeded: bool, duration: Duration) {
        let mut stats = self.stats.lock().await;

        stats.received += 1;
        if succeeded {
            stats.completed += 1;
        } else {
            stats.failed += 1;
        }

        // Exponential average, newest sample weighted 1/2
        if let Some(avg) = stats.avg_duration {
            stats.avg_duration = Some(avg / 2 + duration / 2);
        } else {
            stats.avg_duration = Some(duration);
        }
    }
}
