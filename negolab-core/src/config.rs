//! Serializable tournament configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::domain::{ScoreMetric, ScoreStat};

/// Errors from loading or validating a tournament config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("n_repetitions must be at least 1")]
    ZeroRepetitions,
    #[error("no competitor types configured")]
    NoCompetitors,
    #[error("no scenario paths configured")]
    NoScenarios,
    #[error("opponent_types is present but empty")]
    EmptyOpponents,
}

/// Mechanism identity plus its parameters. Opaque to the scheduler; only the
/// Negotiation Engine interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanismSpec {
    #[serde(rename = "type", default = "default_mechanism_type")]
    pub mechanism_type: String,
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
}

fn default_mechanism_type() -> String {
    "sao".into()
}

impl Default for MechanismSpec {
    fn default() -> Self {
        Self {
            mechanism_type: default_mechanism_type(),
            params: BTreeMap::new(),
        }
    }
}

impl MechanismSpec {
    pub fn param_u64(&self, key: &str) -> Option<u64> {
        self.params.get(key).and_then(|v| v.as_u64())
    }
}

/// Immutable description of one tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// Scored parties, in the order ties are broken.
    pub competitor_types: Vec<String>,
    /// Non-scored counterparts. `None` means competitors play each other.
    #[serde(default)]
    pub opponent_types: Option<Vec<String>>,
    pub scenario_paths: Vec<String>,
    #[serde(default = "default_repetitions")]
    pub n_repetitions: usize,
    #[serde(default)]
    pub rotate_ufuns: bool,
    #[serde(default)]
    pub self_play: bool,
    #[serde(default)]
    pub mechanism: MechanismSpec,
    #[serde(default)]
    pub final_score_metric: ScoreMetric,
    #[serde(default)]
    pub final_score_stat: ScoreStat,
    /// Negative: serial streaming execution. Zero or more: batch execution
    /// with that many worker threads (0 = one per logical CPU).
    #[serde(default = "default_njobs")]
    pub njobs: i32,
    /// Tournament seed for stochastic agents. Mixed into every party seed
    /// together with the engine's own master seed, so one engine can replay
    /// or vary tournaments per config.
    #[serde(default)]
    pub seed: u64,
}

fn default_repetitions() -> usize {
    1
}

fn default_njobs() -> i32 {
    -1
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            competitor_types: Vec::new(),
            opponent_types: None,
            scenario_paths: Vec::new(),
            n_repetitions: default_repetitions(),
            rotate_ufuns: false,
            self_play: false,
            mechanism: MechanismSpec::default(),
            final_score_metric: ScoreMetric::default(),
            final_score_stat: ScoreStat::default(),
            njobs: default_njobs(),
            seed: 0,
        }
    }
}

impl TournamentConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Structural checks only. Whether names and paths resolve is decided
    /// later, against a concrete engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_repetitions == 0 {
            return Err(ConfigError::ZeroRepetitions);
        }
        if self.competitor_types.is_empty() {
            return Err(ConfigError::NoCompetitors);
        }
        if self.scenario_paths.is_empty() {
            return Err(ConfigError::NoScenarios);
        }
        if matches!(&self.opponent_types, Some(o) if o.is_empty()) {
            return Err(ConfigError::EmptyOpponents);
        }
        Ok(())
    }

    pub fn is_streaming(&self) -> bool {
        self.njobs < 0
    }

    /// Deterministic BLAKE3 content hash of the config.
    pub fn fingerprint(&self) -> String {
        // serde_json on a plain struct with BTreeMap params is key-order stable
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
competitor_types = ["boulware", "conceder"]
scenario_paths = ["builtin:pie"]
"#;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = TournamentConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.n_repetitions, 1);
        assert_eq!(config.njobs, -1);
        assert!(config.is_streaming());
        assert!(config.opponent_types.is_none());
        assert_eq!(config.final_score_metric, ScoreMetric::Advantage);
        assert_eq!(config.final_score_stat, ScoreStat::Mean);
        assert_eq!(config.mechanism.mechanism_type, "sao");
    }

    #[test]
    fn full_toml_round_trips_fields() {
        let toml = r#"
competitor_types = ["boulware", "linear", "conceder"]
opponent_types = ["hardliner"]
scenario_paths = ["builtin:pie", "builtin:laptop"]
n_repetitions = 3
rotate_ufuns = true
self_play = true
final_score_metric = "utility"
final_score_stat = "median"
njobs = 4
seed = 7

[mechanism]
type = "sao"
params = { n_steps = 50 }
"#;
        let config = TournamentConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.opponent_types.as_deref(), Some(&["hardliner".to_string()][..]));
        assert_eq!(config.n_repetitions, 3);
        assert!(config.rotate_ufuns && config.self_play);
        assert_eq!(config.final_score_metric, ScoreMetric::Utility);
        assert_eq!(config.final_score_stat, ScoreStat::Median);
        assert!(!config.is_streaming());
        assert_eq!(config.mechanism.param_u64("n_steps"), Some(50));
    }

    #[test]
    fn zero_repetitions_rejected() {
        let toml = format!("{MINIMAL}\nn_repetitions = 0\n");
        assert!(matches!(
            TournamentConfig::from_toml_str(&toml),
            Err(ConfigError::ZeroRepetitions)
        ));
    }

    #[test]
    fn unknown_metric_is_parse_error() {
        let toml = format!("{MINIMAL}\nfinal_score_metric = \"elo\"\n");
        assert!(matches!(
            TournamentConfig::from_toml_str(&toml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn empty_opponents_rejected() {
        let config = TournamentConfig {
            competitor_types: vec!["a".into()],
            scenario_paths: vec!["s".into()],
            opponent_types: Some(vec![]),
            ..TournamentConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyOpponents)));
    }

    #[test]
    fn fingerprint_is_deterministic_and_sensitive() {
        let a = TournamentConfig::from_toml_str(MINIMAL).unwrap();
        let mut b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.n_repetitions = 2;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tournament.toml");
        std::fs::write(&path, MINIMAL).unwrap();
        let config = TournamentConfig::load(&path).unwrap();
        assert_eq!(config.competitor_types.len(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = TournamentConfig::load("/nonexistent/tournament.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
