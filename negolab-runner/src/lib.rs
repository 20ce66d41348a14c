//! NegoLab Runner — round-robin tournament orchestration.
//!
//! This crate builds on `negolab-core` to provide:
//! - Pairing enumeration with exact job counts
//! - Isolated execution of single negotiations
//! - Per-competitor score aggregation and ranking
//! - Streaming (serial, cancellable, progress-reporting) and batch
//!   (parallel, blocking) tournament execution
//! - An in-memory session registry with lifecycle tracking

pub mod aggregator;
pub mod batch;
pub mod enumerator;
pub mod executor;
pub mod registry;
pub mod reporting;
pub mod scheduler;
pub mod session;

pub use aggregator::{CompetitorStats, ScoreAggregator};
pub use batch::ParallelBatchRunner;
pub use enumerator::{expected_total, PairingPlan, ScenarioSlot};
pub use executor::{JobError, NegotiationExecutor};
pub use registry::{SessionHandle, SessionRegistry};
pub use reporting::{spawn_stream, MarkdownReportGenerator, SpawnError};
pub use scheduler::{
    ExecutionStrategy, SchedulerError, StreamEvent, TournamentScheduler, TournamentStream,
};
pub use session::{
    SessionId, SessionStatus, SessionSummary, TournamentResults, TournamentSession,
    TransitionError,
};
