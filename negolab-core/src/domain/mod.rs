//! Domain types for negotiation tournaments

pub mod job;
pub mod outcome;
pub mod progress;
pub mod result;
pub mod score;

pub use job::NegotiationJob;
pub use outcome::{Issue, Outcome, OutcomeSpace};
pub use progress::TournamentProgress;
pub use result::NegotiationResult;
pub use score::{CompetitorScore, ScoreMetric, ScoreStat};

/// Competitor / opponent type name as written in a tournament config.
pub type PartyName = String;
