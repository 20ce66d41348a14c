//! Tournament sessions: the lifecycle object behind one tournament run.
//!
//! `PENDING → RUNNING → {COMPLETED | FAILED | CANCELLED}`. Transitions are
//! one-way. `PENDING` may also fail or be cancelled directly (pre-flight
//! failure, cancellation requested before the first job).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use negolab_core::{CompetitorScore, NegotiationResult, TournamentConfig, TournamentProgress};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, next),
            (Pending, Running | Failed | Cancelled) | (Running, Completed | Failed | Cancelled)
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid session transition {from} -> {to}")]
pub struct TransitionError {
    pub from: SessionStatus,
    pub to: SessionStatus,
}

/// Final report of a completed tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentResults {
    pub final_scores: Vec<CompetitorScore>,
    /// In execution order.
    pub negotiation_results: Vec<NegotiationResult>,
    pub total_negotiations: usize,
    pub n_agreements: usize,
    pub n_errors: usize,
    pub best_competitor: Option<String>,
    pub execution_time_secs: f64,
}

impl TournamentResults {
    pub fn new(
        final_scores: Vec<CompetitorScore>,
        negotiation_results: Vec<NegotiationResult>,
        execution_time_secs: f64,
    ) -> Self {
        let n_agreements = negotiation_results.iter().filter(|r| r.has_agreement()).count();
        let n_errors = negotiation_results.iter().filter(|r| r.has_error).count();
        Self {
            best_competitor: final_scores.first().map(|s| s.name.clone()),
            total_negotiations: negotiation_results.len(),
            n_agreements,
            n_errors,
            final_scores,
            negotiation_results,
            execution_time_secs,
        }
    }

    pub fn agreement_rate(&self) -> Option<f64> {
        if self.total_negotiations == 0 {
            None
        } else {
            Some(self.n_agreements as f64 / self.total_negotiations as f64)
        }
    }
}

/// One tournament invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentSession {
    pub id: SessionId,
    pub config: TournamentConfig,
    pub status: SessionStatus,
    pub progress: TournamentProgress,
    pub results: Option<TournamentResults>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl TournamentSession {
    pub fn new(id: SessionId, config: TournamentConfig) -> Self {
        Self {
            id,
            config,
            status: SessionStatus::Pending,
            progress: TournamentProgress::initial(0),
            results: None,
            start_time: None,
            end_time: None,
            error: None,
        }
    }

    pub(crate) fn transition(&mut self, next: SessionStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        match next {
            SessionStatus::Running => self.start_time = Some(Utc::now()),
            s if s.is_terminal() => self.end_time = Some(Utc::now()),
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn start(&mut self, total: usize) -> Result<(), TransitionError> {
        self.transition(SessionStatus::Running)?;
        self.progress = TournamentProgress::initial(total);
        Ok(())
    }

    pub(crate) fn complete(&mut self, results: TournamentResults) -> Result<(), TransitionError> {
        self.transition(SessionStatus::Completed)?;
        self.results = Some(results);
        Ok(())
    }

    pub(crate) fn fail(&mut self, error: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(SessionStatus::Failed)?;
        self.error = Some(error.into());
        Ok(())
    }

    pub(crate) fn cancel(&mut self) -> Result<(), TransitionError> {
        self.transition(SessionStatus::Cancelled)
    }

    /// Wall-clock run time, once started.
    pub fn duration_secs(&self) -> Option<f64> {
        let start = self.start_time?;
        let end = self.end_time.unwrap_or_else(Utc::now);
        Some((end - start).num_milliseconds() as f64 / 1000.0)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            status: self.status,
            results: self.results.clone(),
            error: self.error.clone(),
            duration_secs: self.duration_secs(),
        }
    }
}

/// Completion projection pushed to subscribers when a run ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub status: SessionStatus,
    pub results: Option<TournamentResults>,
    pub error: Option<String>,
    pub duration_secs: Option<f64>,
}
