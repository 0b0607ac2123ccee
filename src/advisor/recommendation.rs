/// Index recommendation: the sole output unit of the optimizer
use serde::{Deserialize, Serialize};

/// A single index proposal. Column order is the intended index column order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub table: String,
    pub columns: Vec<String>,
    /// Human-readable rationale, embedding the restored SQL fragment that
    /// triggered the advisor
    pub reason: String,
}

impl Recommendation {
    pub fn new(table: impl Into<String>, columns: Vec<String>, reason: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns,
            reason: reason.into(),
        }
    }
}
