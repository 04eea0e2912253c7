//! Statement rendering.
//!
//! The processor only depends on the [`StatementGenerator`] trait: given an
//! invoice and the lookup of its plays, produce the text that ends up in the
//! output file. [`JsonStatementGenerator`] is the bundled renderer; hosts plug
//! their own format in by implementing the trait (closures work too).

use crate::invoice::{Genre, Invoice, PlayId, PlayIndex};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Errors a generator reports instead of aborting the worker.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// A performance references a play that is not in the index
    #[error("performance references unknown play '{play_id}'")]
    UnknownPlay {
        /// The missing play id
        play_id: PlayId,
    },

    /// Rendering failed for another reason
    #[error("{0}")]
    Render(String),

    /// Output could not be serialized
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Renders an invoice into statement content.
///
/// Implementations must be deterministic and free of side effects. They run on
/// a blocking thread, one request at a time.
pub trait StatementGenerator: Send + Sync + 'static {
    /// Render `invoice` using `plays` to resolve performance play ids
    fn generate(&self, invoice: &Invoice, plays: &PlayIndex) -> Result<String, GenerateError>;
}

impl<F> StatementGenerator for F
where
    F: Fn(&Invoice, &PlayIndex) -> Result<String, GenerateError> + Send + Sync + 'static,
{
    fn generate(&self, invoice: &Invoice, plays: &PlayIndex) -> Result<String, GenerateError> {
        self(invoice, plays)
    }
}

#[derive(Serialize)]
struct StatementDocument<'a> {
    invoice_id: Uuid,
    customer: &'a str,
    total_amount: i64,
    total_credits: i64,
    performances: Vec<StatementLine<'a>>,
}

#[derive(Serialize)]
struct StatementLine<'a> {
    play_id: PlayId,
    play: &'a str,
    audience: u32,
    genre: Genre,
}

/// Pretty-printed JSON statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStatementGenerator;

impl JsonStatementGenerator {
    /// Create a new JSON generator
    pub fn new() -> Self {
        Self
    }
}

impl StatementGenerator for JsonStatementGenerator {
    fn generate(&self, invoice: &Invoice, plays: &PlayIndex) -> Result<String, GenerateError> {
        let performances = invoice
            .performances
            .iter()
            .map(|performance| {
                let play = plays
                    .get(&performance.play_id)
                    .ok_or(GenerateError::UnknownPlay {
                        play_id: performance.play_id,
                    })?;
                Ok(StatementLine {
                    play_id: performance.play_id,
                    play: &play.name,
                    audience: performance.audience,
                    genre: performance.genre,
                })
            })
            .collect::<Result<Vec<_>, GenerateError>>()?;

        let document = StatementDocument {
            invoice_id: invoice.id,
            customer: &invoice.customer,
            total_amount: invoice.total_amount,
            total_credits: invoice.total_credits,
            performances,
        };

        Ok(serde_json::to_string_pretty(&document)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::Play;

    #[test]
    fn test_json_statement_contents() {
        let hamlet = Play::new("Hamlet", Genre::Tragedy);
        let othello = Play::new("Othello", Genre::Tragedy);
        let invoice = Invoice::new("BigCo")
            .with_performance(&hamlet, 55)
            .with_performance(&othello, 40)
            .with_totals(173_000, 47);
        let index = PlayIndex::build(&[hamlet.clone(), othello.clone()]);

        let content = JsonStatementGenerator::new()
            .generate(&invoice, &index)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert_eq!(value["customer"], "BigCo");
        assert_eq!(value["total_amount"], 173_000);
        assert_eq!(value["total_credits"], 47);
        assert_eq!(value["performances"][0]["play"], "Hamlet");
        assert_eq!(value["performances"][1]["audience"], 40);
        assert_eq!(value["performances"][1]["genre"], "Tragedy");
    }

    #[test]
    fn test_unknown_play_is_an_error() {
        let hamlet = Play::new("Hamlet", Genre::Tragedy);
        let invoice = Invoice::new("BigCo").with_performance(&hamlet, 55);

        let result = JsonStatementGenerator::new().generate(&invoice, &PlayIndex::default());
        assert!(matches!(
            result,
            Err(GenerateError::UnknownPlay { play_id }) if play_id == hamlet.id
        ));
    }

    #[test]
    fn test_closure_generator() {
        let generator = |invoice: &Invoice, _: &PlayIndex| -> Result<String, GenerateError> {
            Ok(format!("statement for {}", invoice.customer))
        };
        let content = generator
            .generate(&Invoice::new("Acme"), &PlayIndex::default())
            .unwrap();
        assert_eq!(content, "statement for Acme");
    }
}
