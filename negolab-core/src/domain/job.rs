use serde::{Deserialize, Serialize};
use std::fmt;

/// One scheduled pairwise negotiation.
///
/// Identity is `(scenario, competitor, opponent, repetition, rotated)`.
/// `scenario_index` points into the resolved scenario list the job was
/// enumerated from; it is carried so the executor can find the scenario
/// without a lookup by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NegotiationJob {
    pub scenario: String,
    pub scenario_index: usize,
    pub competitor: String,
    pub opponent: String,
    pub repetition: usize,
    pub rotated: bool,
}

impl NegotiationJob {
    /// Party names in execution order (competitor first).
    pub fn partners(&self) -> [String; 2] {
        [self.competitor.clone(), self.opponent.clone()]
    }
}

impl fmt::Display for NegotiationJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vs {} on {} (rep {}{})",
            self.competitor,
            self.opponent,
            self.scenario,
            self.repetition,
            if self.rotated { ", rotated" } else { "" }
        )
    }
}
