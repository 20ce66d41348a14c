//! Built-in scenarios and TOML scenario files.
//!
//! A scenario file lists the issues and one linear-additive utility function
//! per side:
//!
//! ```toml
//! name = "car"
//!
//! [[issues]]
//! name = "price"
//! values = ["low", "high"]
//!
//! [[ufuns]]
//! weights = [1.0]
//! values = [{ low = 1.0, high = 0.0 }]
//! reserved_value = 0.2
//!
//! [[ufuns]]
//! weights = [1.0]
//! values = [{ low = 0.0, high = 1.0 }]
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::ufun::LinearAdditiveUtility;
use crate::domain::{Issue, OutcomeSpace};
use crate::engine::{Scenario, UtilityFunction};

pub const BUILTIN_PREFIX: &str = "builtin:";

/// On-disk scenario layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFile {
    #[serde(default)]
    pub name: Option<String>,
    pub issues: Vec<Issue>,
    pub ufuns: Vec<LinearAdditiveUtility>,
}

impl ScenarioFile {
    pub fn into_scenario(self, fallback_name: &str) -> Scenario {
        Scenario {
            name: self.name.unwrap_or_else(|| fallback_name.to_string()),
            outcome_space: OutcomeSpace::new(self.issues),
            ufuns: self
                .ufuns
                .into_iter()
                .map(|u| Arc::new(u) as Arc<dyn UtilityFunction>)
                .collect(),
        }
    }
}

/// Load a `.toml` scenario file. `None` when unreadable or malformed.
pub fn load_scenario_file(path: &Path) -> Option<Scenario> {
    let contents = std::fs::read_to_string(path).ok()?;
    let file: ScenarioFile = toml::from_str(&contents).ok()?;
    if file.issues.is_empty() || file.ufuns.is_empty() {
        return None;
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Some(file.into_scenario(&stem))
}

/// Names of the built-in scenarios, without the `builtin:` prefix.
pub const BUILTIN_NAMES: [&str; 2] = ["pie", "laptop"];

pub fn builtin(name: &str) -> Option<Scenario> {
    match name {
        "pie" => Some(pie()),
        "laptop" => Some(laptop()),
        _ => None,
    }
}

/// Split ten units between two sides. Zero-sum.
pub fn pie() -> Scenario {
    let values: Vec<String> = (0..=10).map(|i| i.to_string()).collect();
    let first: BTreeMap<String, f64> = (0..=10).map(|i| (i.to_string(), i as f64 / 10.0)).collect();
    let second: BTreeMap<String, f64> = (0..=10)
        .map(|i| (i.to_string(), (10 - i) as f64 / 10.0))
        .collect();
    ScenarioFile {
        name: Some(format!("{BUILTIN_PREFIX}pie")),
        issues: vec![Issue::new("first_share", values)],
        ufuns: vec![
            LinearAdditiveUtility {
                weights: vec![1.0],
                values: vec![first],
                reserved_value: 0.0,
            },
            LinearAdditiveUtility {
                weights: vec![1.0],
                values: vec![second],
                reserved_value: 0.0,
            },
        ],
    }
    .into_scenario("pie")
}

/// Buyer/seller laptop deal over brand, memory and delivery. Integrative:
/// the sides weight issues differently.
pub fn laptop() -> Scenario {
    fn table(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }
    let issues = vec![
        Issue::new("brand", vec!["dell".into(), "mac".into(), "hp".into()]),
        Issue::new("memory", vec!["8".into(), "16".into(), "32".into()]),
        Issue::new("delivery", vec!["1w".into(), "2w".into(), "4w".into()]),
    ];
    let buyer = LinearAdditiveUtility {
        weights: vec![0.3, 0.5, 0.2],
        values: vec![
            table(&[("dell", 0.6), ("mac", 1.0), ("hp", 0.3)]),
            table(&[("8", 0.0), ("16", 0.6), ("32", 1.0)]),
            table(&[("1w", 1.0), ("2w", 0.6), ("4w", 0.0)]),
        ],
        reserved_value: 0.25,
    };
    let seller = LinearAdditiveUtility {
        weights: vec![0.2, 0.3, 0.5],
        values: vec![
            table(&[("dell", 1.0), ("mac", 0.2), ("hp", 0.7)]),
            table(&[("8", 1.0), ("16", 0.6), ("32", 0.0)]),
            table(&[("1w", 0.0), ("2w", 0.5), ("4w", 1.0)]),
        ],
        reserved_value: 0.25,
    };
    ScenarioFile {
        name: Some(format!("{BUILTIN_PREFIX}laptop")),
        issues,
        ufuns: vec![buyer, seller],
    }
    .into_scenario("laptop")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Outcome;

    #[test]
    fn pie_is_zero_sum() {
        let s = pie();
        assert_eq!(s.n_ufuns(), 2);
        for o in s.outcome_space.enumerate() {
            let total = s.ufuns[0].evaluate(&o).unwrap() + s.ufuns[1].evaluate(&o).unwrap();
            assert!((total - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn laptop_has_27_outcomes() {
        let s = laptop();
        assert_eq!(s.outcome_space.cardinality(), 27);
        let o = Outcome(vec!["mac".into(), "32".into(), "1w".into()]);
        assert!((s.ufuns[0].evaluate(&o).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_builtin_is_none() {
        assert!(builtin("chess").is_none());
    }

    #[test]
    fn load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("car.toml");
        let contents = r#"
[[issues]]
name = "price"
values = ["low", "high"]

[[ufuns]]
weights = [1.0]
values = [{ low = 1.0, high = 0.0 }]
reserved_value = 0.2

[[ufuns]]
weights = [1.0]
values = [{ low = 0.0, high = 1.0 }]
"#;
        std::fs::write(&path, contents).unwrap();
        let s = load_scenario_file(&path).unwrap();
        assert_eq!(s.name, "car");
        assert_eq!(s.n_ufuns(), 2);
        assert_eq!(s.ufuns[0].reserved_value(), 0.2);
        assert_eq!(s.ufuns[1].evaluate(&Outcome(vec!["high".into()])), Some(1.0));
    }

    #[test]
    fn malformed_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "issues = 3").unwrap();
        assert!(load_scenario_file(&path).is_none());
        assert!(load_scenario_file(&dir.path().join("missing.toml")).is_none());
    }
}
