//! Final-score selection: which accumulated values rank competitors, and
//! how a value list reduces to one score.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which per-negotiation value list a competitor is ranked on.
///
/// `Welfare` and `PartnerWelfare` currently read the utility list, the same
/// as `Utility`. Neither a summed welfare nor an opponent-utility signal is
/// accumulated yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMetric {
    #[default]
    Advantage,
    Utility,
    Welfare,
    PartnerWelfare,
}

impl ScoreMetric {
    pub const ALL: [ScoreMetric; 4] = [
        Self::Advantage,
        Self::Utility,
        Self::Welfare,
        Self::PartnerWelfare,
    ];

    /// Pick the value list this metric ranks on.
    pub fn select<'a>(&self, utilities: &'a [f64], advantages: &'a [f64]) -> &'a [f64] {
        match self {
            Self::Advantage => advantages,
            Self::Utility | Self::Welfare | Self::PartnerWelfare => utilities,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Advantage => "advantage",
            Self::Utility => "utility",
            Self::Welfare => "welfare",
            Self::PartnerWelfare => "partner_welfare",
        }
    }
}

/// Reduction applied to a competitor's value list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreStat {
    #[default]
    Mean,
    Median,
    Min,
    Max,
    Std,
}

impl ScoreStat {
    pub const ALL: [ScoreStat; 5] = [Self::Mean, Self::Median, Self::Min, Self::Max, Self::Std];

    /// Reduce a value list. An empty list reduces to 0.
    ///
    /// `Std` is the sample standard deviation (divides by `n - 1`); a single
    /// value has std 0.
    pub fn reduce(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        match self {
            Self::Mean => mean(values),
            Self::Median => median(values),
            Self::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Std => sample_std(values),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Min => "min",
            Self::Max => "max",
            Self::Std => "std",
        }
    }
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Unknown metric or statistic name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{name}' (expected one of: {expected})")]
pub struct ParseScoreError {
    pub kind: &'static str,
    pub name: String,
    pub expected: String,
}

impl FromStr for ScoreMetric {
    type Err = ParseScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseScoreError {
                kind: "score metric",
                name: s.to_string(),
                expected: Self::ALL.map(|m| m.as_str()).join(", "),
            })
    }
}

impl FromStr for ScoreStat {
    type Err = ParseScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseScoreError {
                kind: "score statistic",
                name: s.to_string(),
                expected: Self::ALL.map(|m| m.as_str()).join(", "),
            })
    }
}

impl fmt::Display for ScoreMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ScoreStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorScore {
    pub name: String,
    pub type_name: String,
    pub score: f64,
    /// 1-based, 1 = best.
    pub rank: usize,
    pub mean_utility: f64,
    pub mean_advantage: f64,
    pub n_negotiations: usize,
    pub n_agreements: usize,
    /// `None` when the competitor played no negotiations.
    pub agreement_rate: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_reduces_to_zero() {
        for stat in ScoreStat::ALL {
            assert_eq!(stat.reduce(&[]), 0.0);
        }
    }

    #[test]
    fn mean_median_min_max() {
        let v = [3.0, 1.0, 2.0, 10.0];
        assert!((ScoreStat::Mean.reduce(&v) - 4.0).abs() < 1e-12);
        assert!((ScoreStat::Median.reduce(&v) - 2.5).abs() < 1e-12);
        assert_eq!(ScoreStat::Min.reduce(&v), 1.0);
        assert_eq!(ScoreStat::Max.reduce(&v), 10.0);
        assert_eq!(ScoreStat::Median.reduce(&[5.0, 1.0, 3.0]), 3.0);
    }

    #[test]
    fn std_is_sample_std() {
        // mean 2, squared deviations 1 + 0 + 1 = 2, / (3 - 1) = 1
        assert!((ScoreStat::Std.reduce(&[1.0, 2.0, 3.0]) - 1.0).abs() < 1e-12);
        assert_eq!(ScoreStat::Std.reduce(&[0.7]), 0.0);
    }

    #[test]
    fn welfare_metrics_read_utilities() {
        let u = [0.1, 0.2];
        let a = [0.5];
        assert_eq!(ScoreMetric::Advantage.select(&u, &a), &a);
        assert_eq!(ScoreMetric::Utility.select(&u, &a), &u);
        assert_eq!(ScoreMetric::Welfare.select(&u, &a), &u);
        assert_eq!(ScoreMetric::PartnerWelfare.select(&u, &a), &u);
    }

    #[test]
    fn parse_names() {
        assert_eq!("partner_welfare".parse::<ScoreMetric>().unwrap(), ScoreMetric::PartnerWelfare);
        assert_eq!("MEDIAN".parse::<ScoreStat>().unwrap(), ScoreStat::Median);
        let err = "geomean".parse::<ScoreStat>().unwrap_err();
        assert!(err.to_string().contains("geomean"));
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&ScoreMetric::PartnerWelfare).unwrap();
        assert_eq!(json, "\"partner_welfare\"");
        let stat: ScoreStat = serde_json::from_str("\"std\"").unwrap();
        assert_eq!(stat, ScoreStat::Std);
    }
}
