//! Discrete outcome spaces.
//!
//! An outcome assigns one value to every issue, in issue order. The engine
//! never inspects outcomes itself; they travel between the mechanism and the
//! utility functions that score them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One negotiable issue with its discrete value set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub name: String,
    pub values: Vec<String>,
}

impl Issue {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// A complete agreement: one value per issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outcome(pub Vec<String>);

impl Outcome {
    pub fn values(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

/// Cartesian product of issue values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeSpace {
    pub issues: Vec<Issue>,
}

impl OutcomeSpace {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    /// Number of distinct outcomes. Zero if any issue has no values.
    pub fn cardinality(&self) -> usize {
        if self.issues.is_empty() {
            return 0;
        }
        self.issues.iter().map(|i| i.values.len()).product()
    }

    /// Enumerate every outcome in lexicographic issue order.
    pub fn enumerate(&self) -> Vec<Outcome> {
        let mut outcomes: Vec<Vec<String>> = vec![Vec::new()];
        for issue in &self.issues {
            let mut next = Vec::with_capacity(outcomes.len() * issue.values.len());
            for prefix in &outcomes {
                for value in &issue.values {
                    let mut o = prefix.clone();
                    o.push(value.clone());
                    next.push(o);
                }
            }
            outcomes = next;
        }
        if self.issues.is_empty() {
            return Vec::new();
        }
        outcomes.into_iter().map(Outcome).collect()
    }

    pub fn contains(&self, outcome: &Outcome) -> bool {
        outcome.0.len() == self.issues.len()
            && self
                .issues
                .iter()
                .zip(&outcome.0)
                .all(|(issue, v)| issue.values.contains(v))
    }
}
