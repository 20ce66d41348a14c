//! NegoLab Core — domain types and the Negotiation Engine boundary.
//!
//! This crate holds everything the tournament engine exchanges with the
//! outside world:
//! - Domain types (jobs, results, scores, progress, outcome spaces)
//! - Tournament configuration with TOML loading
//! - Negotiation Engine collaborator traits (parties, mechanisms, scenarios, batch runner)
//! - Name → factory competitor registry
//! - Deterministic per-job seeds
//! - A small built-in demo engine

pub mod config;
pub mod demo;
pub mod domain;
pub mod engine;
pub mod registry;
pub mod rng;

pub use config::{ConfigError, MechanismSpec, TournamentConfig};
pub use domain::{
    CompetitorScore, NegotiationJob, NegotiationResult, Outcome, OutcomeSpace, ScoreMetric,
    ScoreStat, TournamentProgress,
};
pub use engine::{
    BatchRequest, BatchRow, BatchRunner, BatchTable, EngineError, Mechanism, NegotiationEngine,
    Negotiator, PartyContext, ResolvedParty, Response, Scenario, UtilityFunction,
};
pub use registry::CompetitorRegistry;
