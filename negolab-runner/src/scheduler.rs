//! Tournament scheduler: drives sessions through pre-flight, execution and
//! scoring.
//!
//! Two strategies with different guarantees, selected by `njobs`:
//!
//! - **Streaming** (`njobs < 0`): one job at a time, in enumeration order.
//!   Every completed job yields a `TournamentProgress`; the cancellation flag
//!   is checked between jobs, so cancellation takes effect within one job.
//!   Each negotiation runs on a private single-thread pool, so at most one
//!   job per session is ever in flight. The pool only keeps agent code off
//!   the caller's thread; the caller still blocks on `install` for the
//!   length of each job.
//! - **Batch** (`njobs >= 0`): the whole job matrix goes to a `BatchRunner`
//!   in one blocking call. No intermediate progress, no mid-run cancellation.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use negolab_core::{
    BatchRequest, BatchRunner, NegotiationEngine, NegotiationJob, NegotiationResult, Scenario,
    ScoreMetric, ScoreStat, TournamentConfig, TournamentProgress,
};

use crate::aggregator::ScoreAggregator;
use crate::batch::ParallelBatchRunner;
use crate::enumerator::{PairingPlan, ScenarioSlot};
use crate::executor::NegotiationExecutor;
use crate::registry::{SessionHandle, SessionRegistry};
use crate::session::{SessionId, SessionSummary, TournamentResults, TournamentSession};

/// Errors from the control surface. Tournament failures are not errors
/// here; they are recorded on the session.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("unknown session '{0}'")]
    UnknownSession(SessionId),
    #[error("session '{0}' has already been started")]
    AlreadyStarted(SessionId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStrategy {
    Streaming,
    /// `njobs` worker threads; 0 = one per logical CPU.
    Batch { njobs: usize },
}

impl ExecutionStrategy {
    pub fn from_njobs(njobs: i32) -> Self {
        if njobs < 0 {
            Self::Streaming
        } else {
            Self::Batch {
                njobs: njobs as usize,
            }
        }
    }
}

/// Event yielded by a streaming run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum StreamEvent {
    Progress(TournamentProgress),
    Finished(SessionSummary),
}

impl StreamEvent {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

/// Resolved tournament inputs, after pre-flight validation.
pub(crate) struct Prepared {
    pub plan: PairingPlan,
    pub scenarios: Vec<Arc<Scenario>>,
    /// `(name, type_name)` of scored parties, in config order.
    pub scored: Vec<(String, String)>,
}

/// Resolve scenarios and party names against `engine`.
///
/// Unresolvable entries are dropped with a warning. Fails when no scenario
/// remains or fewer than two distinct parties can play.
pub(crate) fn preflight(
    engine: &dyn NegotiationEngine,
    config: &TournamentConfig,
) -> Result<Prepared, String> {
    config
        .validate()
        .map_err(|e| format!("invalid tournament config: {e}"))?;

    let mut scenarios = Vec::with_capacity(config.scenario_paths.len());
    for path in &config.scenario_paths {
        match engine.load_scenario(path) {
            Some(s) => scenarios.push(s),
            None => warn!(path = %path, "skipping unresolvable scenario"),
        }
    }
    if scenarios.is_empty() {
        return Err(format!(
            "no valid scenarios: none of {} scenario path(s) could be loaded",
            config.scenario_paths.len()
        ));
    }

    let resolve_all = |names: &[String]| -> (Vec<(String, String)>, Vec<String>) {
        let mut resolved: Vec<(String, String)> = Vec::new();
        let mut missing = Vec::new();
        for name in names {
            match engine.resolve_competitor_type(name) {
                // Keyed on the registered name: the registry is case-insensitive.
                Some(p) => {
                    if !resolved.iter().any(|(n, _)| n.eq_ignore_ascii_case(&p.name)) {
                        resolved.push((p.name, p.type_name));
                    }
                }
                None => missing.push(name.clone()),
            }
        }
        (resolved, missing)
    };

    let (scored, missing) = resolve_all(&config.competitor_types);
    if !missing.is_empty() {
        warn!(missing = ?missing, "skipping unresolvable competitor types");
    }

    let opponents = match &config.opponent_types {
        None => None,
        Some(names) => {
            let (resolved, missing) = resolve_all(names);
            if !missing.is_empty() {
                warn!(missing = ?missing, "skipping unresolvable opponent types");
            }
            Some(resolved)
        }
    };

    let mut distinct: Vec<&str> = scored.iter().map(|(n, _)| n.as_str()).collect();
    for (n, _) in opponents.iter().flatten() {
        if !distinct.iter().any(|d| d.eq_ignore_ascii_case(n)) {
            distinct.push(n);
        }
    }
    if scored.is_empty() || distinct.len() < 2 {
        return Err(format!(
            "need at least 2 resolvable competitor types, found {} ({} unresolved: {})",
            distinct.len(),
            missing.len(),
            missing.join(", ")
        ));
    }
    if matches!(&opponents, Some(o) if o.is_empty()) {
        return Err("no resolvable opponent types".to_string());
    }

    let plan = PairingPlan {
        scenarios: scenarios
            .iter()
            .map(|s| ScenarioSlot {
                name: s.name.clone(),
                n_ufuns: s.n_ufuns(),
            })
            .collect(),
        competitors: scored.iter().map(|(n, _)| n.clone()).collect(),
        opponents: opponents.map(|o| o.into_iter().map(|(n, _)| n).collect()),
        n_repetitions: config.n_repetitions,
        rotate_ufuns: config.rotate_ufuns,
        self_play: config.self_play,
    };
    if plan.total() == 0 {
        return Err("no negotiations to run: every pairing was excluded".to_string());
    }

    Ok(Prepared {
        plan,
        scenarios,
        scored,
    })
}

pub struct TournamentScheduler {
    engine: Arc<dyn NegotiationEngine>,
    batch_runner: Arc<dyn BatchRunner>,
    registry: Arc<SessionRegistry>,
}

impl TournamentScheduler {
    /// Scheduler with its own registry and the rayon batch runner.
    pub fn new(engine: Arc<dyn NegotiationEngine>) -> Self {
        Self {
            batch_runner: Arc::new(ParallelBatchRunner::new(engine.clone())),
            registry: Arc::new(SessionRegistry::new()),
            engine,
        }
    }

    /// Use the engine's own batch runner for batch mode.
    pub fn with_batch_runner(mut self, runner: Arc<dyn BatchRunner>) -> Self {
        self.batch_runner = runner;
        self
    }

    /// Share a session table with other schedulers.
    pub fn with_registry(mut self, registry: Arc<SessionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn create_session(&self, config: TournamentConfig) -> SessionId {
        let handle = self.registry.create(config);
        info!(session = %handle.id(), "tournament session created");
        handle.id().clone()
    }

    pub fn get_session(&self, id: &SessionId) -> Option<TournamentSession> {
        self.registry.get(id)
    }

    pub fn list_sessions(&self) -> Vec<TournamentSession> {
        self.registry.list()
    }

    pub fn cancel(&self, id: &SessionId) -> bool {
        let found = self.registry.cancel(id);
        if found {
            info!(session = %id, "cancellation requested");
        }
        found
    }

    fn claim(&self, id: &SessionId) -> Result<Arc<SessionHandle>, SchedulerError> {
        let handle = self
            .registry
            .handle(id)
            .ok_or_else(|| SchedulerError::UnknownSession(id.clone()))?;
        if !handle.claim() {
            return Err(SchedulerError::AlreadyStarted(id.clone()));
        }
        Ok(handle)
    }

    /// Start a streaming run. Nothing executes until the stream is pulled.
    pub fn run_stream(&self, id: &SessionId) -> Result<TournamentStream, SchedulerError> {
        let handle = self.claim(id)?;
        Ok(TournamentStream {
            handle,
            engine: self.engine.clone(),
            state: StreamState::NotStarted,
        })
    }

    /// Run the whole tournament through the batch runner. Blocks to completion.
    pub fn run_batch(&self, id: &SessionId) -> Result<TournamentSession, SchedulerError> {
        let handle = self.claim(id)?;
        let config = handle.snapshot().config;
        let njobs = config.njobs.max(0) as usize;

        if handle.is_cancel_requested() {
            finish_cancelled(&handle);
            return Ok(handle.snapshot());
        }

        let prepared = match preflight(self.engine.as_ref(), &config) {
            Ok(p) => p,
            Err(msg) => {
                finish_failed(&handle, msg);
                return Ok(handle.snapshot());
            }
        };

        let total = prepared.plan.total();
        set_running(&handle, total);
        info!(session = %handle.id(), total, njobs, "batch run started");

        let request = BatchRequest {
            competitors: prepared.plan.competitors.clone(),
            opponents: prepared.plan.opponents.clone(),
            scenarios: prepared.scenarios.clone(),
            rotate_ufuns: config.rotate_ufuns,
            n_repetitions: config.n_repetitions,
            njobs,
            mechanism: config.mechanism.clone(),
            self_play: config.self_play,
            final_score: (config.final_score_metric, config.final_score_stat),
            seed: config.seed,
        };

        let started = Instant::now();
        match self.batch_runner.run_tournament_batch(&request) {
            Ok(table) => {
                let mut aggregator = ScoreAggregator::with_competitors(prepared.scored);
                let mut results = Vec::with_capacity(table.len());
                let explicit = prepared.plan.opponents.is_some();
                for row in table.rows {
                    record(&mut aggregator, explicit, &row.result);
                    results.push(row.result);
                }
                let completed = results.len();
                handle.update(|s| {
                    s.progress = TournamentProgress::new(completed, total, "", Default::default())
                });
                finish_completed(
                    &handle,
                    &aggregator,
                    results,
                    config.final_score_metric,
                    config.final_score_stat,
                    started,
                );
            }
            Err(e) => finish_failed(&handle, e.to_string()),
        }
        Ok(handle.snapshot())
    }

    /// Run a session with the strategy its config selects, to completion.
    pub fn run(&self, id: &SessionId) -> Result<TournamentSession, SchedulerError> {
        let config = self
            .registry
            .get(id)
            .ok_or_else(|| SchedulerError::UnknownSession(id.clone()))?
            .config;
        match ExecutionStrategy::from_njobs(config.njobs) {
            ExecutionStrategy::Batch { .. } => self.run_batch(id),
            ExecutionStrategy::Streaming => {
                let handle = self.claim(id)?;
                let stream = TournamentStream {
                    handle: handle.clone(),
                    engine: self.engine.clone(),
                    state: StreamState::NotStarted,
                };
                stream.for_each(drop);
                Ok(handle.snapshot())
            }
        }
    }
}

/// Credit a result to its scored partners. Against an explicit opponent
/// list only the competitor side (position 0) is scored.
fn record(
    aggregator: &mut ScoreAggregator,
    explicit_opponents: bool,
    result: &NegotiationResult,
) {
    if explicit_opponents {
        aggregator.update_party(&result.partners[0], 0, result);
    } else {
        aggregator.update(&result.partners, result);
    }
}

fn set_running(handle: &SessionHandle, total: usize) {
    handle.update(|s| {
        if let Err(e) = s.start(total) {
            warn!(session = %s.id, error = %e, "could not mark session running");
        }
    });
}

fn finish_failed(handle: &SessionHandle, msg: impl Into<String>) {
    let msg = msg.into();
    warn!(session = %handle.id(), error = %msg, "tournament failed");
    handle.update(|s| {
        if let Err(e) = s.fail(msg) {
            warn!(session = %s.id, error = %e, "could not mark session failed");
        }
    });
}

fn finish_cancelled(handle: &SessionHandle) {
    info!(session = %handle.id(), "tournament cancelled");
    handle.update(|s| {
        if let Err(e) = s.cancel() {
            warn!(session = %s.id, error = %e, "could not mark session cancelled");
        }
    });
}

fn finish_completed(
    handle: &SessionHandle,
    aggregator: &ScoreAggregator,
    results: Vec<NegotiationResult>,
    metric: ScoreMetric,
    stat: ScoreStat,
    started: Instant,
) {
    let scores = aggregator.finalize(metric, stat);
    let report = TournamentResults::new(scores, results, started.elapsed().as_secs_f64());
    info!(
        session = %handle.id(),
        negotiations = report.total_negotiations,
        agreements = report.n_agreements,
        errors = report.n_errors,
        best = ?report.best_competitor,
        "tournament completed"
    );
    handle.update(|s| {
        if let Err(e) = s.complete(report) {
            warn!(session = %s.id, error = %e, "could not mark session completed");
        }
    });
}

/// Per-run state of a streaming session.
struct RunState {
    executor: NegotiationExecutor,
    jobs: std::vec::IntoIter<NegotiationJob>,
    scenarios: Vec<Arc<Scenario>>,
    aggregator: ScoreAggregator,
    explicit_opponents: bool,
    results: Vec<NegotiationResult>,
    completed: usize,
    total: usize,
    metric: ScoreMetric,
    stat: ScoreStat,
    pool: rayon::ThreadPool,
    started: Instant,
}

enum StreamState {
    NotStarted,
    Running(Box<RunState>),
    Done,
}

/// Lazy streaming run. Pulling the iterator executes the tournament: each
/// `next()` runs at most one job.
///
/// The last item is always `StreamEvent::Finished`. Dropping the stream
/// before that, pulled or not, cancels the session.
pub struct TournamentStream {
    handle: Arc<SessionHandle>,
    engine: Arc<dyn NegotiationEngine>,
    state: StreamState,
}

impl TournamentStream {
    pub fn session_id(&self) -> &SessionId {
        self.handle.id()
    }

    fn finished(&mut self) -> Option<StreamEvent> {
        self.state = StreamState::Done;
        Some(StreamEvent::Finished(self.handle.snapshot().summary()))
    }

    fn begin(&mut self) -> Option<StreamEvent> {
        if self.handle.is_cancel_requested() {
            finish_cancelled(&self.handle);
            return self.finished();
        }

        let config = self.handle.snapshot().config;
        let prepared = match preflight(self.engine.as_ref(), &config) {
            Ok(p) => p,
            Err(msg) => {
                finish_failed(&self.handle, msg);
                return self.finished();
            }
        };

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .thread_name(|i| format!("negolab-job-{i}"))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                finish_failed(&self.handle, format!("failed to start worker pool: {e}"));
                return self.finished();
            }
        };

        let total = prepared.plan.total();
        let explicit_opponents = prepared.plan.opponents.is_some();
        let jobs: Vec<NegotiationJob> = prepared.plan.jobs().collect();
        debug_assert_eq!(jobs.len(), total);
        set_running(&self.handle, total);
        info!(session = %self.handle.id(), total, "streaming run started");

        self.state = StreamState::Running(Box::new(RunState {
            executor: NegotiationExecutor::new(self.engine.clone(), config.mechanism.clone())
                .with_seed(config.seed),
            jobs: jobs.into_iter(),
            scenarios: prepared.scenarios,
            aggregator: ScoreAggregator::with_competitors(prepared.scored),
            explicit_opponents,
            results: Vec::with_capacity(total),
            completed: 0,
            total,
            metric: config.final_score_metric,
            stat: config.final_score_stat,
            pool,
            started: Instant::now(),
        }));
        self.step()
    }

    fn step(&mut self) -> Option<StreamEvent> {
        let StreamState::Running(run) = &mut self.state else {
            return None;
        };

        if self.handle.is_cancel_requested() {
            debug!(session = %self.handle.id(), completed = run.completed, "cancellation observed");
            finish_cancelled(&self.handle);
            return self.finished();
        }

        let Some(job) = run.jobs.next() else {
            let results = std::mem::take(&mut run.results);
            finish_completed(&self.handle, &run.aggregator, results, run.metric, run.stat, run.started);
            return self.finished();
        };

        let scenario = run.scenarios[job.scenario_index].clone();
        let executor = &run.executor;
        let result = run.pool.install(|| executor.execute(&job, &scenario));
        if result.has_error {
            debug!(job = %job, error = ?result.error_details, "job recorded as error");
        }

        let partners = job.partners();
        record(&mut run.aggregator, run.explicit_opponents, &result);
        run.results.push(result);
        run.completed += 1;

        let progress = TournamentProgress::new(run.completed, run.total, job.scenario, partners);
        let snapshot = progress.clone();
        self.handle.update(|s| s.progress = snapshot);

        // Let other sessions' loops run between jobs.
        std::thread::yield_now();
        Some(StreamEvent::Progress(progress))
    }
}

impl Iterator for TournamentStream {
    type Item = StreamEvent;

    fn next(&mut self) -> Option<StreamEvent> {
        match self.state {
            StreamState::NotStarted => self.begin(),
            StreamState::Running(_) => self.step(),
            StreamState::Done => None,
        }
    }
}

impl Drop for TournamentStream {
    fn drop(&mut self) {
        match self.state {
            StreamState::NotStarted => {
                warn!(session = %self.handle.id(), "stream dropped before start, cancelling session");
                finish_cancelled(&self.handle);
            }
            StreamState::Running(_) => {
                warn!(session = %self.handle.id(), "stream dropped mid-run, cancelling session");
                finish_cancelled(&self.handle);
            }
            StreamState::Done => {}
        }
    }
}
