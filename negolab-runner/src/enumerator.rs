//! Pairing enumeration: the exact, ordered job list of a tournament.
//!
//! Order: scenario → repetition → competitor → opponent → (unrotated, rotated).
//! `total()` walks the same pairing rule as `jobs()`, so progress percentages
//! computed from it are exact.

use negolab_core::NegotiationJob;

/// What the enumerator needs to know about a resolved scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSlot {
    pub name: String,
    pub n_ufuns: usize,
}

/// Resolved pairing inputs.
#[derive(Debug, Clone)]
pub struct PairingPlan {
    pub scenarios: Vec<ScenarioSlot>,
    pub competitors: Vec<String>,
    /// `None`: competitors play each other.
    pub opponents: Option<Vec<String>>,
    pub n_repetitions: usize,
    pub rotate_ufuns: bool,
    pub self_play: bool,
}

impl PairingPlan {
    fn opponents(&self) -> &[String] {
        self.opponents.as_deref().unwrap_or(&self.competitors)
    }

    /// Competitor/opponent index pairs that meet, in enumeration order.
    ///
    /// Without self-play a party never meets itself: by index when
    /// competitors play each other, by name against an explicit opponent list.
    pub fn pairings(&self) -> Vec<(usize, usize)> {
        let opponents = self.opponents();
        let mut pairs = Vec::with_capacity(self.competitors.len() * opponents.len());
        for (i, competitor) in self.competitors.iter().enumerate() {
            for (j, opponent) in opponents.iter().enumerate() {
                let same = match self.opponents {
                    None => i == j,
                    Some(_) => competitor.eq_ignore_ascii_case(opponent),
                };
                if !self.self_play && same {
                    continue;
                }
                pairs.push((i, j));
            }
        }
        pairs
    }

    fn rotations(&self, scenario: &ScenarioSlot) -> usize {
        if self.rotate_ufuns && scenario.n_ufuns == 2 {
            2
        } else {
            1
        }
    }

    /// Number of jobs `jobs()` will produce.
    pub fn total(&self) -> usize {
        let pairs = self.pairings().len();
        self.scenarios
            .iter()
            .map(|s| self.n_repetitions * pairs * self.rotations(s))
            .sum()
    }

    /// Lazily enumerate every job in order.
    pub fn jobs(&self) -> impl Iterator<Item = NegotiationJob> + '_ {
        let pairs = self.pairings();
        let opponents = self.opponents();
        self.scenarios
            .iter()
            .enumerate()
            .flat_map(move |(scenario_index, scenario)| {
                let pairs = pairs.clone();
                (0..self.n_repetitions).flat_map(move |repetition| {
                    let pairs = pairs.clone();
                    pairs.into_iter().flat_map(move |(i, j)| {
                        (0..self.rotations(scenario)).map(move |r| NegotiationJob {
                            scenario: scenario.name.clone(),
                            scenario_index,
                            competitor: self.competitors[i].clone(),
                            opponent: opponents[j].clone(),
                            repetition,
                            rotated: r == 1,
                        })
                    })
                })
            })
    }
}

/// Closed-form job count when competitors play each other and every
/// scenario is two-sided.
pub fn expected_total(
    n_scenarios: usize,
    n_competitors: usize,
    n_repetitions: usize,
    self_play: bool,
    rotate_ufuns: bool,
) -> usize {
    let pairings = if self_play {
        n_competitors * n_competitors
    } else {
        n_competitors * n_competitors.saturating_sub(1)
    };
    n_scenarios * n_repetitions * pairings * if rotate_ufuns { 2 } else { 1 }
}
