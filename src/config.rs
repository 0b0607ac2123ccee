/// Configuration for the index advisor
use serde::{Deserialize, Serialize};

/// Optimizer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Maximum number of columns in a recommended composite index
    pub max_composite_columns: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_composite_columns: 5, // wider composite indexes rarely pay for their write cost
        }
    }
}

impl OptimizerConfig {
    /// Create config with a custom composite column budget
    pub fn with_max_columns(max_composite_columns: usize) -> Self {
        Self {
            max_composite_columns,
        }
    }
}
