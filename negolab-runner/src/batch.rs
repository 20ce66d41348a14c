//! Rayon-backed batch runner.
//!
//! Runs the whole job matrix on a private thread pool and returns one row
//! per job, in enumeration order regardless of completion order.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use negolab_core::{
    BatchRequest, BatchRow, BatchRunner, BatchTable, EngineError, NegotiationEngine,
    NegotiationJob,
};

use crate::enumerator::{PairingPlan, ScenarioSlot};
use crate::executor::NegotiationExecutor;

pub struct ParallelBatchRunner {
    engine: Arc<dyn NegotiationEngine>,
}

impl ParallelBatchRunner {
    pub fn new(engine: Arc<dyn NegotiationEngine>) -> Self {
        Self { engine }
    }

    fn plan(request: &BatchRequest) -> PairingPlan {
        PairingPlan {
            scenarios: request
                .scenarios
                .iter()
                .map(|s| ScenarioSlot {
                    name: s.name.clone(),
                    n_ufuns: s.n_ufuns(),
                })
                .collect(),
            competitors: request.competitors.clone(),
            opponents: request.opponents.clone(),
            n_repetitions: request.n_repetitions,
            rotate_ufuns: request.rotate_ufuns,
            self_play: request.self_play,
        }
    }
}

impl BatchRunner for ParallelBatchRunner {
    fn run_tournament_batch(&self, request: &BatchRequest) -> Result<BatchTable, EngineError> {
        let jobs: Vec<NegotiationJob> = Self::plan(request).jobs().collect();
        let executor = NegotiationExecutor::new(self.engine.clone(), request.mechanism.clone())
            .with_seed(request.seed);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(request.njobs)
            .thread_name(|i| format!("negolab-batch-{i}"))
            .build()
            .map_err(|e| EngineError::Batch(format!("failed to build thread pool: {e}")))?;

        debug!(jobs = jobs.len(), threads = pool.current_num_threads(), "batch dispatch");

        let rows = pool.install(|| {
            jobs.into_par_iter()
                .map(|job| {
                    let result = executor.execute(&job, &request.scenarios[job.scenario_index]);
                    BatchRow { job, result }
                })
                .collect::<Vec<_>>()
        });

        Ok(BatchTable { rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use negolab_core::demo::DemoEngine;
    use negolab_core::{MechanismSpec, NegotiationEngine};

    fn request(engine: &DemoEngine, njobs: usize) -> BatchRequest {
        BatchRequest {
            competitors: vec!["boulware".into(), "linear".into(), "conceder".into()],
            opponents: None,
            scenarios: vec![
                engine.load_scenario("builtin:pie").unwrap(),
                engine.load_scenario("builtin:laptop").unwrap(),
            ],
            rotate_ufuns: true,
            n_repetitions: 2,
            njobs,
            mechanism: MechanismSpec::default(),
            self_play: false,
            final_score: Default::default(),
            seed: 0,
        }
    }

    #[test]
    fn rows_follow_enumeration_order() {
        let engine = Arc::new(DemoEngine::new());
        let req = request(&engine, 4);
        let table = ParallelBatchRunner::new(engine.clone()).run_tournament_batch(&req).unwrap();

        let expected: Vec<NegotiationJob> = ParallelBatchRunner::plan(&req).jobs().collect();
        assert_eq!(table.len(), expected.len());
        assert_eq!(table.len(), 2 * 2 * 6 * 2);
        for (row, job) in table.rows.iter().zip(&expected) {
            assert_eq!(&row.job, job);
            assert_eq!(row.result.partners, job.partners());
            assert_eq!(row.result.rotated, job.rotated);
        }
    }

    #[test]
    fn thread_count_does_not_change_results() {
        let engine = Arc::new(DemoEngine::new());
        let one = ParallelBatchRunner::new(engine.clone())
            .run_tournament_batch(&request(&engine, 1))
            .unwrap();
        let many = ParallelBatchRunner::new(engine.clone())
            .run_tournament_batch(&request(&engine, 0))
            .unwrap();
        let strip = |t: &BatchTable| {
            t.rows
                .iter()
                .map(|r| (r.result.agreement.clone(), r.result.utilities))
                .collect::<Vec<_>>()
        };
        assert_eq!(strip(&one), strip(&many));
    }
}
