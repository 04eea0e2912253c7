//! Invoice domain model and the per-request play lookup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a play
pub type PlayId = Uuid;

/// Theatrical genre of a play or performance
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Genre {
    /// Tragedy
    Tragedy,
    /// Comedy
    Comedy,
    /// Historical drama
    History,
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Genre::Tragedy => "Tragedy",
            Genre::Comedy => "Comedy",
            Genre::History => "History",
        };
        f.write_str(name)
    }
}

/// A theatrical work
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Play {
    /// Unique play identifier
    pub id: PlayId,
    /// Display name
    pub name: String,
    /// Genre of the play
    pub genre: Genre,
}

impl Play {
    /// Create a play with a fresh identifier
    pub fn new(name: impl Into<String>, genre: Genre) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            genre,
        }
    }
}

/// One play's appearance on an invoice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Performance {
    /// The play that was performed
    pub play_id: PlayId,
    /// Audience size
    pub audience: u32,
    /// Genre billed for this performance
    pub genre: Genre,
}

/// Billing record for one customer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Invoice {
    /// Invoice identifier
    pub id: Uuid,
    /// Customer name, also the output file key
    pub customer: String,
    /// Total amount in cents
    pub total_amount: i64,
    /// Volume credits earned
    pub total_credits: i64,
    /// Performances in billing order
    pub performances: Vec<Performance>,
}

impl Invoice {
    /// Create an empty invoice for a customer
    pub fn new(customer: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer: customer.into(),
            total_amount: 0,
            total_credits: 0,
            performances: Vec::new(),
        }
    }

    /// Append a performance
    pub fn with_performance(mut self, play: &Play, audience: u32) -> Self {
        self.performances.push(Performance {
            play_id: play.id,
            audience,
            genre: play.genre,
        });
        self
    }

    /// Set the invoice totals
    pub fn with_totals(mut self, total_amount: i64, total_credits: i64) -> Self {
        self.total_amount = total_amount;
        self.total_credits = total_credits;
        self
    }
}

/// Unit of work submitted for rendering: an invoice plus the plays it references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvoiceRequest {
    /// The invoice to render
    pub invoice: Invoice,
    /// Plays referenced by the invoice's performances, in caller order
    pub plays: Vec<Play>,
}

impl InvoiceRequest {
    /// Create a new request
    pub fn new(invoice: Invoice, plays: Vec<Play>) -> Self {
        Self { invoice, plays }
    }

    /// Customer name of the wrapped invoice
    pub fn customer(&self) -> &str {
        &self.invoice.customer
    }

    /// Identifier of the wrapped invoice
    pub fn invoice_id(&self) -> Uuid {
        self.invoice.id
    }
}

/// Lookup from play id to play, built per request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayIndex {
    plays: HashMap<PlayId, Play>,
    duplicates: Vec<PlayId>,
}

impl PlayIndex {
    /// Build the index from plays in order. A repeated id replaces the earlier
    /// entry and is recorded in [`PlayIndex::duplicates`].
    pub fn build(plays: &[Play]) -> Self {
        let mut index = Self {
            plays: HashMap::with_capacity(plays.len()),
            duplicates: Vec::new(),
        };

        for play in plays {
            if index.plays.insert(play.id, play.clone()).is_some() {
                index.duplicates.push(play.id);
            }
        }

        index
    }

    /// Look up a play
    pub fn get(&self, id: &PlayId) -> Option<&Play> {
        self.plays.get(id)
    }

    /// Ids that appeared more than once, in the order they were replaced
    pub fn duplicates(&self) -> &[PlayId] {
        &self.duplicates
    }

    /// Number of distinct plays
    pub fn len(&self) -> usize {
        self.plays.len()
    }

    /// Whether the index holds no plays
    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }
}

impl From<&[Play]> for PlayIndex {
    fn from(plays: &[Play]) -> Self {
        Self::build(plays)
    }
}
