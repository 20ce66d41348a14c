//! Score aggregation: running per-competitor statistics and the final
//! ranking.
//!
//! Competitors keep the order they were registered in; ranking is a stable
//! sort on score, so ties keep that order too.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use negolab_core::domain::score::mean;
use negolab_core::{CompetitorScore, NegotiationResult, ScoreMetric, ScoreStat};

/// Running statistics for one competitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompetitorStats {
    pub name: String,
    pub type_name: String,
    pub utilities: Vec<f64>,
    pub advantages: Vec<f64>,
    pub n_negotiations: usize,
    pub n_agreements: usize,
}

impl CompetitorStats {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    pub fn agreement_rate(&self) -> Option<f64> {
        if self.n_negotiations == 0 {
            None
        } else {
            Some(self.n_agreements as f64 / self.n_negotiations as f64)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator {
    stats: Vec<CompetitorStats>,
    index: HashMap<String, usize>,
}

impl ScoreAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregator tracking `competitors`, in order. Each entry is
    /// `(name, type_name)`.
    pub fn with_competitors<I, N, T>(competitors: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: Into<String>,
    {
        let mut agg = Self::new();
        for (name, type_name) in competitors {
            agg.track(name, type_name);
        }
        agg
    }

    /// Start tracking a competitor. No-op if already tracked.
    pub fn track(&mut self, name: impl Into<String>, type_name: impl Into<String>) {
        let name = name.into();
        if self.index.contains_key(&name) {
            return;
        }
        self.index.insert(name.clone(), self.stats.len());
        self.stats.push(CompetitorStats::new(name, type_name));
    }

    /// Fold one result into the stats of both partners.
    ///
    /// Partners that are not tracked (non-scored opponents) are ignored.
    pub fn update(&mut self, names: &[String; 2], result: &NegotiationResult) {
        for (k, name) in names.iter().enumerate() {
            self.update_party(name, k, result);
        }
    }

    /// Fold one result into the stats of the partner at position `k` only.
    pub fn update_party(&mut self, name: &str, k: usize, result: &NegotiationResult) {
        let Some(&idx) = self.index.get(name) else {
            return;
        };
        let stats = &mut self.stats[idx];
        stats.n_negotiations += 1;
        if result.agreement.is_some() {
            stats.n_agreements += 1;
        }
        if let Some(u) = result.utilities {
            stats.utilities.push(u[k]);
        }
        if let Some(a) = result.advantages {
            stats.advantages.push(a[k]);
        }
    }

    pub fn stats(&self) -> &[CompetitorStats] {
        &self.stats
    }

    pub fn get(&self, name: &str) -> Option<&CompetitorStats> {
        self.index.get(name).map(|&i| &self.stats[i])
    }

    pub fn total_negotiations(&self) -> usize {
        self.stats.iter().map(|s| s.n_negotiations).sum()
    }

    /// Rank every tracked competitor by `stat` over its `metric` values.
    pub fn finalize(&self, metric: ScoreMetric, stat: ScoreStat) -> Vec<CompetitorScore> {
        let mut scores: Vec<CompetitorScore> = self
            .stats
            .iter()
            .map(|s| CompetitorScore {
                name: s.name.clone(),
                type_name: s.type_name.clone(),
                score: stat.reduce(metric.select(&s.utilities, &s.advantages)),
                rank: 0,
                mean_utility: mean(&s.utilities),
                mean_advantage: mean(&s.advantages),
                n_negotiations: s.n_negotiations,
                n_agreements: s.n_agreements,
                agreement_rate: s.agreement_rate(),
            })
            .collect();

        // Stable sort, descending; NaN compares equal and stays put.
        scores.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for (i, s) in scores.iter_mut().enumerate() {
            s.rank = i + 1;
        }
        scores
    }
}
