//! Result delivery: background streaming into a channel, and a markdown
//! leaderboard report.

use std::fmt::Write as _;
use std::io;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use crate::scheduler::{SchedulerError, StreamEvent, TournamentScheduler};
use crate::session::{SessionId, SessionStatus, TournamentSession};

#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error("failed to spawn tournament thread: {0}")]
    Thread(#[from] io::Error),
}

/// Drive a streaming run on a dedicated thread, forwarding every event to
/// `tx`.
///
/// The session is claimed before the thread starts, so an unknown or
/// already-started session is reported here rather than on the channel.
/// If the receiver goes away the run is abandoned and the session cancelled.
pub fn spawn_stream(
    scheduler: &TournamentScheduler,
    id: &SessionId,
    tx: Sender<StreamEvent>,
) -> Result<JoinHandle<()>, SpawnError> {
    let stream = scheduler.run_stream(id)?;
    let handle = thread::Builder::new()
        .name(format!("negolab-{id}"))
        .spawn(move || {
            for event in stream {
                if tx.send(event).is_err() {
                    break;
                }
            }
        })?;
    Ok(handle)
}

pub struct MarkdownReportGenerator;

impl MarkdownReportGenerator {
    pub fn generate(&self, session: &TournamentSession) -> String {
        let config = &session.config;
        let mut report = format!(
            "# Tournament Report\n\n\
Session: `{}`\n\n\
- Status: {:?}\n\
- Competitors: {}\n\
- Scenarios: {}\n\
- Repetitions: {}\n\
- Final score: {} of {}\n",
            session.id,
            session.status,
            config.competitor_types.join(", "),
            config.scenario_paths.len(),
            config.n_repetitions,
            config.final_score_stat.as_str(),
            config.final_score_metric,
        );

        if let Some(secs) = session.duration_secs() {
            let _ = writeln!(report, "- Duration: {secs:.2}s");
        }
        if let Some(err) = &session.error {
            let _ = writeln!(report, "\n## Error\n\n{err}");
        }

        let Some(results) = &session.results else {
            if session.status == SessionStatus::Cancelled {
                report.push_str("\nCancelled before completion.\n");
            }
            return report;
        };

        let _ = writeln!(
            report,
            "\n## Summary\n\n\
- Negotiations: {}\n\
- Agreements: {} ({:.1}%)\n\
- Errors: {}\n\
- Best: {}",
            results.total_negotiations,
            results.n_agreements,
            results.agreement_rate().unwrap_or(0.0) * 100.0,
            results.n_errors,
            results.best_competitor.as_deref().unwrap_or("-"),
        );

        report.push_str("\n## Leaderboard\n\n");
        report.push_str("| Rank | Competitor | Type | Score | Utility | Advantage | Agreements |\n");
        report.push_str("|------|------------|------|-------|---------|-----------|------------|\n");
        for s in &results.final_scores {
            let _ = writeln!(
                report,
                "| {} | {} | {} | {:.4} | {:.4} | {:.4} | {}/{} |",
                s.rank,
                s.name,
                s.type_name,
                s.score,
                s.mean_utility,
                s.mean_advantage,
                s.n_agreements,
                s.n_negotiations,
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use negolab_core::demo::DemoEngine;
    use negolab_core::TournamentConfig;
    use std::sync::mpsc;
    use std::sync::Arc;

    fn config() -> TournamentConfig {
        TournamentConfig {
            competitor_types: vec!["boulware".into(), "conceder".into()],
            scenario_paths: vec!["builtin:pie".into()],
            ..TournamentConfig::default()
        }
    }

    #[test]
    fn spawned_stream_delivers_every_event() {
        let scheduler = TournamentScheduler::new(Arc::new(DemoEngine::new()));
        let id = scheduler.create_session(config());
        let (tx, rx) = mpsc::channel();
        let join = spawn_stream(&scheduler, &id, tx).unwrap();
        let events: Vec<StreamEvent> = rx.iter().collect();
        join.join().unwrap();

        assert_eq!(events.len(), 3);
        assert!(events[2].is_finished());
        assert_eq!(scheduler.get_session(&id).unwrap().status, SessionStatus::Completed);
    }

    #[test]
    fn spawn_rejects_unknown_session() {
        let scheduler = TournamentScheduler::new(Arc::new(DemoEngine::new()));
        let (tx, _rx) = mpsc::channel();
        let err = spawn_stream(&scheduler, &SessionId::from("missing"), tx).unwrap_err();
        assert!(matches!(err, SpawnError::Scheduler(SchedulerError::UnknownSession(_))));
    }

    #[test]
    fn report_lists_every_competitor() {
        let scheduler = TournamentScheduler::new(Arc::new(DemoEngine::new()));
        let id = scheduler.create_session(config());
        let session = scheduler.run_batch(&id).unwrap();
        let report = MarkdownReportGenerator.generate(&session);
        assert!(report.contains("# Tournament Report"));
        assert!(report.contains("| 1 |"));
        assert!(report.contains("| 2 |"));
        assert!(report.contains("boulware"));
        assert!(report.contains("conceder"));
    }

    #[test]
    fn report_of_failed_session_shows_error() {
        let scheduler = TournamentScheduler::new(Arc::new(DemoEngine::new()));
        let id = scheduler.create_session(TournamentConfig {
            competitor_types: vec!["boulware".into(), "ghost".into()],
            ..config()
        });
        let session = scheduler.run_batch(&id).unwrap();
        let report = MarkdownReportGenerator.generate(&session);
        assert!(report.contains("## Error"));
        assert!(!report.contains("## Leaderboard"));
    }
}
