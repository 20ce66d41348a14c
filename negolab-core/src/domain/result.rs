use serde::{Deserialize, Serialize};

use super::outcome::Outcome;

/// Outcome of executing one `NegotiationJob`.
///
/// `utilities[k]` and `advantages[k]` always belong to `partners[k]`, whether
/// or not the utility functions were rotated for this run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationResult {
    pub scenario: String,
    pub partners: [String; 2],
    pub rotated: bool,
    pub repetition: usize,
    pub agreement: Option<Outcome>,
    pub utilities: Option<[f64; 2]>,
    pub advantages: Option<[f64; 2]>,
    pub has_error: bool,
    pub error_details: Option<String>,
    pub execution_time_secs: Option<f64>,
}

impl NegotiationResult {
    /// A failed job. Counts as a negotiation but never as an agreement.
    pub fn failed(
        scenario: impl Into<String>,
        partners: [String; 2],
        rotated: bool,
        repetition: usize,
        details: impl Into<String>,
    ) -> Self {
        Self {
            scenario: scenario.into(),
            partners,
            rotated,
            repetition,
            agreement: None,
            utilities: None,
            advantages: None,
            has_error: true,
            error_details: Some(details.into()),
            execution_time_secs: None,
        }
    }

    pub fn has_agreement(&self) -> bool {
        self.agreement.is_some()
    }
}

/// `advantages[k] = utilities[k] - utilities[1 - k]`.
pub fn advantages_of(utilities: [f64; 2]) -> [f64; 2] {
    [utilities[0] - utilities[1], utilities[1] - utilities[0]]
}
