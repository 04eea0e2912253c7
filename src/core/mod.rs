//! The statement service: queue, processor and sink wired together.
//!
//! The service is built stopped. `start` spawns the single processor task,
//! `stop` closes the queue and waits for everything already submitted to be
//! written (or to fail) before returning.

use crate::config::{DurationExt, StatementConfig};
use crate::error::{StatementError, StatementResult};
use crate::generator::StatementGenerator;
use crate::invoice::InvoiceRequest;
use crate::queue::{InvoiceQueue, QueueStats};
use crate::sink::{FileSink, OutputSink};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub mod processor;

pub use processor::{ProcessorStats, QueueProcessor};

enum ServiceState {
    Stopped,
    Running(JoinHandle<()>),
    ShutDown,
}

/// Accepts invoice requests and renders them in the background.
///
/// # Examples
///
/// ```rust,no_run
/// use statementq::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> StatementResult<()> {
///     let config = StatementConfig::testing("statements");
///     let service = StatementService::new(config, JsonStatementGenerator::new())?;
///     service.start().await?;
///
///     let hamlet = Play::new("Hamlet", Genre::Tragedy);
///     let invoice = Invoice::new("BigCo").with_performance(&hamlet, 55);
///     service.enqueue(InvoiceRequest::new(invoice, vec![hamlet]))?;
///
///     service.stop().await?;
///     Ok(())
/// }
/// ```
pub struct StatementService {
    config: StatementConfig,
    queue: Arc<InvoiceQueue>,
    generator: Arc<dyn StatementGenerator>,
    sink: Arc<dyn OutputSink>,
    stats: Arc<Mutex<ProcessorStats>>,
    state: Mutex<ServiceState>,
}

impl StatementService {
    /// Create a service writing files as described by `config.output`.
    ///
    /// The output directory is created here; an existing directory is fine.
    pub fn new<G>(config: StatementConfig, generator: G) -> StatementResult<Self>
    where
        G: StatementGenerator,
    {
        validate_config(&config)?;
        let sink = FileSink::from_config(&config.output)?;
        Self::with_sink(config, generator, sink)
    }

    /// Create a service with a custom output sink.
    pub fn with_sink<G, S>(config: StatementConfig, generator: G, sink: S) -> StatementResult<Self>
    where
        G: StatementGenerator,
        S: OutputSink + 'static,
    {
        validate_config(&config)?;

        Ok(Self {
            queue: Arc::new(InvoiceQueue::with_config(config.queue.clone())),
            generator: Arc::new(generator),
            sink: Arc::new(sink),
            stats: Arc::new(Mutex::new(ProcessorStats::default())),
            state: Mutex::new(ServiceState::Stopped),
            config,
        })
    }

    /// Spawn the background processor.
    ///
    /// Requests enqueued before this call are processed first, in order.
    pub async fn start(&self) -> StatementResult<()> {
        let mut state = self.state.lock().await;
        match *state {
            ServiceState::Running(_) => return Err(StatementError::AlreadyRunning),
            ServiceState::ShutDown => return Err(StatementError::ShutDown),
            ServiceState::Stopped => {}
        }

        let processor = QueueProcessor::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.generator),
            Arc::clone(&self.sink),
            self.config.processor.clone(),
            Arc::clone(&self.stats),
        );
        *state = ServiceState::Running(tokio::spawn(processor.run()));

        tracing::info!(
            "Statement service started, writing to {}",
            self.config.output.directory.display()
        );
        Ok(())
    }

    /// Close the queue and wait for the processor to drain it.
    ///
    /// If draining takes longer than the configured shutdown timeout the
    /// processor is aborted and [`StatementError::Timeout`] is returned. The
    /// service cannot be started again afterwards.
    pub async fn stop(&self) -> StatementResult<()> {
        let mut state = self.state.lock().await;
        let mut handle = match std::mem::replace(&mut *state, ServiceState::ShutDown) {
            ServiceState::Running(handle) => handle,
            previous => {
                *state = previous;
                return Err(StatementError::NotRunning);
            }
        };

        self.queue.close();
        let timeout_secs = self.config.processor.shutdown_timeout_secs;
        tracing::info!(
            "Stopping statement service, draining {} pending requests",
            self.queue.len()
        );

        match tokio::time::timeout(timeout_secs.secs(), &mut handle).await {
            Ok(Ok(())) => {
                tracing::info!("Statement service stopped");
                Ok(())
            }
            Ok(Err(join_error)) => Err(processor_failure(join_error, self.queue.len())),
            Err(_) => {
                handle.abort();
                tracing::warn!(
                    "Statement processor did not drain within {}s, {} requests dropped",
                    timeout_secs,
                    self.queue.len()
                );
                Err(StatementError::Timeout { timeout_secs })
            }
        }
    }

    /// Submit a request for rendering. Never blocks.
    ///
    /// Accepted requests are processed in submission order once the service
    /// is running. Failures during processing are only visible in the logs.
    pub fn enqueue(&self, request: InvoiceRequest) -> StatementResult<()> {
        self.queue.enqueue(request)
    }

    /// Wait for Ctrl+C, then stop gracefully.
    pub async fn wait_for_shutdown(&self) -> StatementResult<()> {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| StatementError::config(format!("cannot listen for Ctrl+C: {e}")))?;
        tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        self.stop().await
    }

    /// Check if the processor is running.
    pub async fn is_running(&self) -> bool {
        matches!(*self.state.lock().await, ServiceState::Running(_))
    }

    /// Get queue statistics.
    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    /// Get processor statistics.
    pub async fn processor_stats(&self) -> ProcessorStats {
        self.stats.lock().await.clone()
    }

    /// Get the configuration used by this service.
    pub fn config(&self) -> &StatementConfig {
        &self.config
    }
}

impl Drop for StatementService {
    fn drop(&mut self) {
        // Let a detached processor finish the backlog and exit.
        if self.queue.close() {
            if let Ok(state) = self.state.try_lock() {
                if matches!(*state, ServiceState::Running(_)) {
                    tracing::warn!(
                        "Statement service dropped while running. Call stop() explicitly for graceful shutdown."
                    );
                }
            }
        }
    }
}

fn processor_failure(join_error: tokio::task::JoinError, pending: usize) -> StatementError {
    tracing::error!(
        "Statement processor terminated abnormally, {} requests dropped: {}",
        pending,
        join_error
    );
    StatementError::ProcessorFailed {
        message: join_error.to_string(),
        pending,
    }
}

fn validate_config(config: &StatementConfig) -> StatementResult<()> {
    config
        .validate()
        .map_err(|errors| StatementError::config(errors.join("; ")))
}
