//! Negotiation executor: runs one job against the Negotiation Engine.
//!
//! `execute()` never fails: unknown agents, construction errors, mechanism
//! errors and panics inside agent or mechanism code all come back as a
//! `NegotiationResult` with `has_error = true`, so one bad job cannot abort a
//! tournament.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use negolab_core::domain::result::advantages_of;
use negolab_core::rng::job_seed;
use negolab_core::{
    EngineError, MechanismSpec, NegotiationEngine, NegotiationJob, NegotiationResult, Outcome,
    PartyContext, Scenario,
};

/// Why a job failed before or during the negotiation.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("unknown competitor type '{0}'")]
    UnknownCompetitor(String),
    #[error("scenario '{name}' has {n_ufuns} utility functions, need at least 2")]
    TooFewUfuns { name: String, n_ufuns: usize },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("negotiation panicked: {0}")]
    Panicked(String),
}

pub struct NegotiationExecutor {
    engine: Arc<dyn NegotiationEngine>,
    mechanism: MechanismSpec,
    seed: u64,
}

impl NegotiationExecutor {
    pub fn new(engine: Arc<dyn NegotiationEngine>, mechanism: MechanismSpec) -> Self {
        Self {
            engine,
            mechanism,
            seed: 0,
        }
    }

    /// Tournament seed, mixed with the engine's master seed. Zero leaves
    /// the engine's seed as is.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Run `job` on `scenario`. Never panics, never returns an error.
    pub fn execute(&self, job: &NegotiationJob, scenario: &Scenario) -> NegotiationResult {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.try_execute(job, scenario)))
            .unwrap_or_else(|payload| Err(JobError::Panicked(panic_message(payload.as_ref()))));

        match outcome {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(job = %job, error = %e, "job failed");
                NegotiationResult::failed(
                    &job.scenario,
                    job.partners(),
                    job.rotated,
                    job.repetition,
                    e.to_string(),
                )
            }
        }
    }

    fn try_execute(
        &self,
        job: &NegotiationJob,
        scenario: &Scenario,
    ) -> Result<NegotiationResult, JobError> {
        let competitor = self
            .engine
            .resolve_competitor_type(&job.competitor)
            .ok_or_else(|| JobError::UnknownCompetitor(job.competitor.clone()))?;
        let opponent = self
            .engine
            .resolve_competitor_type(&job.opponent)
            .ok_or_else(|| JobError::UnknownCompetitor(job.opponent.clone()))?;

        if scenario.n_ufuns() < 2 {
            return Err(JobError::TooFewUfuns {
                name: scenario.name.clone(),
                n_ufuns: scenario.n_ufuns(),
            });
        }

        let mut mechanism = self
            .engine
            .build_mechanism(&scenario.outcome_space, &self.mechanism)?;

        // Party k holds ufun k, or ufun 1-k when rotated.
        let assigned = if job.rotated {
            [scenario.ufuns[1].clone(), scenario.ufuns[0].clone()]
        } else {
            [scenario.ufuns[0].clone(), scenario.ufuns[1].clone()]
        };

        let master = self.engine.master_seed() ^ self.seed.rotate_left(32);
        let parties = [&competitor, &opponent];
        for (position, (party, ufun)) in parties.into_iter().zip(&assigned).enumerate() {
            let ctx = PartyContext {
                name: party.name.clone(),
                position,
                seed: job_seed(master, job, position),
            };
            mechanism.add(party.construct(&ctx)?, ufun.clone())?;
        }

        let started = Instant::now();
        let agreement = mechanism.run()?;
        let elapsed = started.elapsed().as_secs_f64();

        // Reported per partner, so index k always belongs to partners[k].
        let utilities = agreement.as_ref().and_then(|o| evaluate_pair(&assigned, o));

        Ok(NegotiationResult {
            scenario: job.scenario.clone(),
            partners: job.partners(),
            rotated: job.rotated,
            repetition: job.repetition,
            agreement,
            utilities,
            advantages: utilities.map(advantages_of),
            has_error: false,
            error_details: None,
            execution_time_secs: Some(elapsed),
        })
    }
}

fn evaluate_pair(
    ufuns: &[Arc<dyn negolab_core::UtilityFunction>; 2],
    outcome: &Outcome,
) -> Option<[f64; 2]> {
    Some([ufuns[0].evaluate(outcome)?, ufuns[1].evaluate(outcome)?])
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
