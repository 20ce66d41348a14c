//! Negotiation Engine collaborator: the capabilities the tournament engine
//! consumes but does not implement.
//!
//! The tournament engine treats one negotiation as an atomic, possibly
//! failing call: resolve two parties by name, build a mechanism over the
//! scenario's outcome space, add the parties with their utility functions,
//! run, and score the agreement.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::MechanismSpec;
use crate::domain::{NegotiationJob, NegotiationResult, Outcome, OutcomeSpace, ScoreMetric, ScoreStat};

/// Errors raised by a Negotiation Engine implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unknown mechanism type '{0}'")]
    UnknownMechanism(String),
    #[error("invalid mechanism parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("failed to construct party '{name}': {reason}")]
    Construction { name: String, reason: String },
    #[error("mechanism accepts {max} parties, got another")]
    TooManyParties { max: usize },
    #[error("mechanism needs {needed} parties, has {got}")]
    NotEnoughParties { needed: usize, got: usize },
    #[error("negotiation failed: {0}")]
    Runtime(String),
    #[error("batch execution failed: {0}")]
    Batch(String),
}

/// Scores outcomes for one side of a scenario.
pub trait UtilityFunction: Send + Sync + fmt::Debug {
    /// `None` when the outcome is outside the function's domain.
    fn evaluate(&self, outcome: &Outcome) -> Option<f64>;

    /// Utility of walking away without agreement.
    fn reserved_value(&self) -> f64 {
        0.0
    }
}

/// Reply to an offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Accept,
    Reject,
    EndNegotiation,
}

/// A negotiating party. Constructed fresh for every job.
pub trait Negotiator: Send {
    /// Called once before the first offer, with the party's own utility function.
    fn on_start(&mut self, space: &OutcomeSpace, ufun: Arc<dyn UtilityFunction>);

    /// Next offer. `time` runs from 0 (start) to 1 (deadline).
    fn propose(&mut self, time: f64) -> Option<Outcome>;

    fn respond(&mut self, offer: &Outcome, time: f64) -> Response;
}

/// A negotiation protocol instance for one job.
pub trait Mechanism: Send {
    fn add(
        &mut self,
        party: Box<dyn Negotiator>,
        ufun: Arc<dyn UtilityFunction>,
    ) -> Result<(), EngineError>;

    /// Run to completion. `Ok(None)` means the parties did not agree.
    fn run(&mut self) -> Result<Option<Outcome>, EngineError>;
}

/// Factory producing a fresh party instance.
pub type PartyFactory =
    Arc<dyn Fn(&PartyContext) -> Result<Box<dyn Negotiator>, EngineError> + Send + Sync>;

/// Per-job construction context handed to party factories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyContext {
    pub name: String,
    /// Position in the mechanism (0 = opens).
    pub position: usize,
    /// Deterministic per-job seed for stochastic parties.
    pub seed: u64,
}

/// A competitor type resolved by name.
#[derive(Clone)]
pub struct ResolvedParty {
    pub name: String,
    pub type_name: String,
    pub factory: PartyFactory,
}

impl ResolvedParty {
    pub fn construct(&self, ctx: &PartyContext) -> Result<Box<dyn Negotiator>, EngineError> {
        (self.factory)(ctx)
    }
}

impl fmt::Debug for ResolvedParty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedParty")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// A negotiation domain: outcome space plus one utility function per side.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub outcome_space: OutcomeSpace,
    pub ufuns: Vec<Arc<dyn UtilityFunction>>,
}

impl Scenario {
    pub fn n_ufuns(&self) -> usize {
        self.ufuns.len()
    }
}

/// The capabilities the tournament engine needs from a negotiation library.
pub trait NegotiationEngine: Send + Sync {
    fn resolve_competitor_type(&self, name: &str) -> Option<ResolvedParty>;

    fn load_scenario(&self, path: &str) -> Option<Arc<Scenario>>;

    fn build_mechanism(
        &self,
        outcome_space: &OutcomeSpace,
        spec: &MechanismSpec,
    ) -> Result<Box<dyn Mechanism>, EngineError>;

    /// Master seed mixed into per-job party seeds.
    fn master_seed(&self) -> u64 {
        0
    }
}

/// Everything a batch runner needs to play a full tournament in one call.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub competitors: Vec<String>,
    pub opponents: Option<Vec<String>>,
    pub scenarios: Vec<Arc<Scenario>>,
    pub rotate_ufuns: bool,
    pub n_repetitions: usize,
    /// Worker threads; 0 = one per logical CPU.
    pub njobs: usize,
    pub mechanism: MechanismSpec,
    pub self_play: bool,
    pub final_score: (ScoreMetric, ScoreStat),
    /// Tournament seed; see `TournamentConfig::seed`.
    pub seed: u64,
}

/// One row of a batch results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRow {
    pub job: NegotiationJob,
    pub result: NegotiationResult,
}

/// Complete, ordered batch results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchTable {
    pub rows: Vec<BatchRow>,
}

impl BatchTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parallel tournament entry point. Blocks until every job has run.
pub trait BatchRunner: Send + Sync {
    fn run_tournament_batch(&self, request: &BatchRequest) -> Result<BatchTable, EngineError>;
}
