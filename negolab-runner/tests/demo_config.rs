//! The shipped demo tournament parses and runs end to end.

use std::path::PathBuf;
use std::sync::Arc;

use negolab_core::demo::DemoEngine;
use negolab_core::{ScoreMetric, ScoreStat, TournamentConfig};
use negolab_runner::{SessionStatus, TournamentScheduler};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .to_path_buf()
}

fn demo_config() -> TournamentConfig {
    let root = workspace_root();
    let mut config = TournamentConfig::load(root.join("demos/round_robin.toml")).unwrap();
    for path in &mut config.scenario_paths {
        if !path.starts_with("builtin:") {
            *path = root.join(&*path).to_string_lossy().into_owned();
        }
    }
    config
}

#[test]
fn demo_config_parses() {
    let config = demo_config();
    assert_eq!(config.competitor_types.len(), 5);
    assert_eq!(config.scenario_paths.len(), 3);
    assert_eq!(config.n_repetitions, 3);
    assert!(config.rotate_ufuns);
    assert_eq!(config.final_score_metric, ScoreMetric::Advantage);
    assert_eq!(config.final_score_stat, ScoreStat::Mean);
    assert_eq!(config.mechanism.mechanism_type, "sao");
    assert_eq!(config.mechanism.param_u64("n_steps"), Some(60));
    assert!(config.is_streaming());
}

#[test]
fn demo_tournament_completes() {
    let config = demo_config();
    let scheduler = TournamentScheduler::new(Arc::new(DemoEngine::new()));
    let id = scheduler.create_session(config);
    let session = scheduler.run(&id).unwrap();

    assert_eq!(session.status, SessionStatus::Completed, "{:?}", session.error);
    let results = session.results.unwrap();
    // 3 scenarios x 3 repetitions x 20 ordered pairs x 2 rotations
    assert_eq!(results.total_negotiations, 3 * 3 * 20 * 2);
    assert_eq!(results.n_errors, 0);
    assert_eq!(results.final_scores.len(), 5);
    assert!(results.n_agreements > 0);
}
