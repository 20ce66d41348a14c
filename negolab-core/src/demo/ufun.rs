use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::Outcome;
use crate::engine::UtilityFunction;

/// Weighted sum of per-issue value tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearAdditiveUtility {
    pub weights: Vec<f64>,
    /// One table per issue: issue value → score.
    pub values: Vec<BTreeMap<String, f64>>,
    #[serde(default)]
    pub reserved_value: f64,
}

impl UtilityFunction for LinearAdditiveUtility {
    fn evaluate(&self, outcome: &Outcome) -> Option<f64> {
        if outcome.0.len() != self.weights.len() || self.values.len() != self.weights.len() {
            return None;
        }
        let mut total = 0.0;
        for ((w, table), v) in self.weights.iter().zip(&self.values).zip(&outcome.0) {
            total += w * table.get(v)?;
        }
        Some(total)
    }

    fn reserved_value(&self) -> f64 {
        self.reserved_value
    }
}
