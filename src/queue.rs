//! The invoice queue feeding the background processor.
//!
//! An in-process FIFO backed by a tokio unbounded channel. Producers call
//! [`InvoiceQueue::enqueue`] from any thread without awaiting; the single
//! consumer awaits [`InvoiceQueue::dequeue`]. Closing the queue stops new
//! submissions while everything already buffered stays deliverable.

use crate::config::QueueConfig;
use crate::error::{StatementError, StatementResult};
use crate::invoice::InvoiceRequest;
use crate::sink::validate_key;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

/// Statistics about the queue state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Requests buffered and not yet handed to the consumer
    pub pending: usize,
    /// Requests accepted since creation
    pub enqueued: u64,
    /// Requests refused by enqueue
    pub rejected: u64,
}

/// Thread-safe FIFO of pending render requests.
#[derive(Debug)]
pub struct InvoiceQueue {
    /// Producer side; `None` once closed
    sender: Mutex<Option<mpsc::UnboundedSender<InvoiceRequest>>>,
    /// Consumer side
    receiver: tokio::sync::Mutex<mpsc::UnboundedReceiver<InvoiceRequest>>,
    pending: AtomicUsize,
    enqueued: AtomicU64,
    rejected: AtomicU64,
    config: QueueConfig,
}

impl InvoiceQueue {
    /// Create an unbounded queue
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// Create a queue with custom configuration
    pub fn with_config(config: QueueConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            sender: Mutex::new(Some(tx)),
            receiver: tokio::sync::Mutex::new(rx),
            pending: AtomicUsize::new(0),
            enqueued: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            config,
        }
    }

    fn sender(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<InvoiceRequest>>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Submit a request. Never blocks.
    ///
    /// Fails with [`StatementError::InvalidInput`] if the customer name cannot
    /// be used as an output key, [`StatementError::QueueFull`] if a bound is
    /// configured and reached, and [`StatementError::QueueClosed`] after
    /// [`InvoiceQueue::close`]. A failed call leaves the queue untouched.
    pub fn enqueue(&self, request: InvoiceRequest) -> StatementResult<()> {
        let result = self.try_enqueue(request);
        if result.is_err() {
            self.rejected.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    fn try_enqueue(&self, request: InvoiceRequest) -> StatementResult<()> {
        validate_key(request.customer())?;

        let sender = self.sender();
        let tx = sender.as_ref().ok_or(StatementError::QueueClosed)?;

        self.reserve_slot()?;

        let invoice_id = request.invoice_id();
        if tx.send(request).is_err() {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            return Err(StatementError::QueueClosed);
        }

        self.enqueued.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Enqueued invoice {}", invoice_id);
        Ok(())
    }

    fn reserve_slot(&self) -> StatementResult<()> {
        let max_size = self.config.max_queue_size;
        if max_size == 0 {
            self.pending.fetch_add(1, Ordering::AcqRel);
            return Ok(());
        }

        self.pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |pending| {
                (pending < max_size).then_some(pending + 1)
            })
            .map(|_| ())
            .map_err(|_| StatementError::QueueFull { max_size })
    }

    /// Wait for the next request.
    ///
    /// Returns `None` once the queue is closed and every buffered request has
    /// been handed out. Intended for the single consumer only.
    pub async fn dequeue(&self) -> Option<InvoiceRequest> {
        let mut receiver = self.receiver.lock().await;
        let request = receiver.recv().await;
        if request.is_some() {
            self.pending.fetch_sub(1, Ordering::AcqRel);
        }
        request
    }

    /// Stop accepting requests. Returns `false` if already closed.
    pub fn close(&self) -> bool {
        let closed = self.sender().take().is_some();
        if closed {
            tracing::debug!(
                "Invoice queue closed with {} pending requests",
                self.len()
            );
        }
        closed
    }

    /// Whether [`InvoiceQueue::close`] has been called
    pub fn is_closed(&self) -> bool {
        self.sender().is_none()
    }

    /// Number of requests waiting for the consumer
    pub fn len(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Whether no requests are waiting
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get queue statistics
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            pending: self.len(),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

impl Default for InvoiceQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::Invoice;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    fn create_test_request(customer: &str) -> InvoiceRequest {
        InvoiceRequest::new(Invoice::new(customer), Vec::new())
    }

    #[tokio::test]
    async fn test_enqueue_dequeue_fifo() {
        let queue = InvoiceQueue::new();

        for customer in ["A", "B", "C"] {
            assert_ok!(queue.enqueue(create_test_request(customer)));
        }
        assert_eq!(queue.len(), 3);

        for expected in ["A", "B", "C"] {
            let request = queue.dequeue().await.unwrap();
            assert_eq!(request.customer(), expected);
        }
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_customer_rejected() {
        let queue = InvoiceQueue::new();

        let result = queue.enqueue(create_test_request("   "));
        assert!(matches!(result, Err(StatementError::InvalidInput { .. })));
        let result = queue.enqueue(create_test_request("../escape"));
        assert!(matches!(result, Err(StatementError::InvalidInput { .. })));

        assert!(queue.is_empty());
        assert_ok!(queue.enqueue(create_test_request("Valid")));

        let stats = queue.stats();
        assert_eq!(stats.enqueued, 1);
        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.pending, 1);
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let queue = InvoiceQueue::new();
        queue.enqueue(create_test_request("A")).unwrap();
        queue.enqueue(create_test_request("B")).unwrap();

        assert!(queue.close());
        assert!(!queue.close());
        assert!(queue.is_closed());

        let result = queue.enqueue(create_test_request("C"));
        assert!(matches!(result, Err(StatementError::QueueClosed)));

        assert_eq!(queue.dequeue().await.unwrap().customer(), "A");
        assert_eq!(queue.dequeue().await.unwrap().customer(), "B");
        assert!(queue.dequeue().await.is_none());
    }

    #[tokio::test]
    async fn test_dequeue_waits_for_item() {
        let queue = Arc::new(InvoiceQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.dequeue().await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!consumer.is_finished());

        queue.enqueue(create_test_request("Late")).unwrap();
        let request = consumer.await.unwrap().unwrap();
        assert_eq!(request.customer(), "Late");
    }

    #[tokio::test]
    async fn test_close_wakes_waiting_consumer() {
        let queue = Arc::new(InvoiceQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.dequeue().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close();
        assert!(consumer.await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_queue_size_limit() {
        let queue = InvoiceQueue::with_config(QueueConfig::bounded(2));

        assert_ok!(queue.enqueue(create_test_request("A")));
        assert_ok!(queue.enqueue(create_test_request("B")));

        let result = queue.enqueue(create_test_request("C"));
        assert!(matches!(result, Err(StatementError::QueueFull { max_size: 2 })));

        // Draining one frees a slot
        queue.dequeue().await.unwrap();
        assert_ok!(queue.enqueue(create_test_request("C")));
        assert_err!(queue.enqueue(create_test_request("D")));
    }

    #[test]
    fn test_concurrent_producers() {
        let queue = Arc::new(InvoiceQueue::new());

        let handles: Vec<_> = (0..8)
            .map(|producer| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        queue
                            .enqueue(create_test_request(&format!("customer-{producer}-{i}")))
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(queue.len(), 400);
        assert_eq!(queue.stats().enqueued, 400);
    }
}
