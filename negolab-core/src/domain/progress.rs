use serde::{Deserialize, Serialize};

/// Progress update emitted after every completed job in streaming mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentProgress {
    pub completed: usize,
    pub total: usize,
    pub current_scenario: String,
    pub current_partners: [String; 2],
    pub percent: f64,
}

impl TournamentProgress {
    pub fn new(
        completed: usize,
        total: usize,
        current_scenario: impl Into<String>,
        current_partners: [String; 2],
    ) -> Self {
        let percent = if total > 0 {
            100.0 * completed as f64 / total as f64
        } else {
            0.0
        };
        Self {
            completed,
            total,
            current_scenario: current_scenario.into(),
            current_partners,
            percent,
        }
    }

    /// Progress before any job has run.
    pub fn initial(total: usize) -> Self {
        Self::new(0, total, "", [String::new(), String::new()])
    }
}
