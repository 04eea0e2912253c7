//! # statementq
//!
//! Fire-and-forget rendering of billing statements.
//!
//! Callers enqueue an invoice together with the plays it references; a single
//! background processor renders each request and writes one file per customer.
//! Submitting never blocks on rendering or disk I/O.
//!
//! ## Features
//!
//! - **Ordered**: requests are rendered and written in submission order
//! - **Isolated failures**: a request that fails to render or write is logged
//!   and skipped, the processor keeps going
//! - **Explicit lifecycle**: build stopped, `start()`, then `stop()` drains the queue
//! - **Pluggable**: bring your own [`StatementGenerator`] or [`OutputSink`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use statementq::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> StatementResult<()> {
//!     statementq::telemetry::init(&LoggingConfig::default())?;
//!
//!     let config = StatementConfig {
//!         output: OutputConfig::new("statements"),
//!         ..Default::default()
//!     };
//!     let service = StatementService::new(config, JsonStatementGenerator::new())?;
//!     service.start().await?;
//!
//!     let hamlet = Play::new("Hamlet", Genre::Tragedy);
//!     let invoice = Invoice::new("BigCo")
//!         .with_performance(&hamlet, 55)
//!         .with_totals(65_000, 25);
//!     service.enqueue(InvoiceRequest::new(invoice, vec![hamlet]))?;
//!
//!     // statements/BigCo.json is written once the processor gets to it
//!     service.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod generator;
pub mod invoice;
pub mod queue;
pub mod sink;
pub mod telemetry;

pub mod prelude {
    pub use crate::config::*;
    pub use crate::core::{ProcessorStats, StatementService};
    pub use crate::error::{StatementError, StatementResult};
    pub use crate::generator::{GenerateError, JsonStatementGenerator, StatementGenerator};
    pub use crate::invoice::{Genre, Invoice, InvoiceRequest, Performance, Play, PlayId, PlayIndex};
    pub use crate::queue::{InvoiceQueue, QueueStats};
    pub use crate::sink::{FileSink, OutputSink};
    pub use async_trait::async_trait;
}

pub use crate::config::*;
pub use crate::core::{ProcessorStats, QueueProcessor, StatementService};
pub use crate::error::{StatementError, StatementResult};
pub use crate::generator::{GenerateError, JsonStatementGenerator, StatementGenerator};
pub use crate::invoice::{Genre, Invoice, InvoiceRequest, Performance, Play, PlayId, PlayIndex};
pub use crate::queue::{InvoiceQueue, QueueStats};
pub use crate::sink::{FileSink, OutputSink};
pub use async_trait::async_trait;
