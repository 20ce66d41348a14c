//! Built-in negotiating parties.
//!
//! Time-based concession agents aim at a target utility that falls from the
//! best achievable utility towards the reserved value as the deadline nears:
//!
//! `target(t) = max - (max - reserve) * t^(1/e)`
//!
//! `e < 1` concedes late (Boulware), `e = 1` linearly, `e > 1` early
//! (Conceder). A hardliner never moves off its best outcome.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;

use crate::domain::{Outcome, OutcomeSpace};
use crate::engine::{Negotiator, Response, UtilityFunction};
use crate::rng::rng_from_seed;

/// Outcomes sorted best-first by the party's own utility.
fn rank_outcomes(space: &OutcomeSpace, ufun: &dyn UtilityFunction) -> Vec<(Outcome, f64)> {
    let mut ranked: Vec<(Outcome, f64)> = space
        .enumerate()
        .into_iter()
        .filter_map(|o| ufun.evaluate(&o).map(|u| (o, u)))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked
}

/// Time-dependent concession with exponent `e`. `e == 0` never concedes.
#[derive(Debug, Default)]
pub struct TimeBasedAgent {
    exponent: f64,
    ufun: Option<Arc<dyn UtilityFunction>>,
    ranked: Vec<(Outcome, f64)>,
}

impl TimeBasedAgent {
    pub fn new(exponent: f64) -> Self {
        Self {
            exponent,
            ufun: None,
            ranked: Vec::new(),
        }
    }

    pub fn boulware() -> Self {
        Self::new(0.2)
    }

    pub fn linear() -> Self {
        Self::new(1.0)
    }

    pub fn conceder() -> Self {
        Self::new(2.0)
    }

    pub fn hardliner() -> Self {
        Self::new(0.0)
    }

    fn target(&self, time: f64) -> f64 {
        let Some((_, best)) = self.ranked.first() else {
            return f64::INFINITY;
        };
        let reserve = self.ufun.as_ref().map_or(0.0, |u| u.reserved_value());
        if self.exponent <= 0.0 {
            return *best;
        }
        let t = time.clamp(0.0, 1.0);
        best - (best - reserve).max(0.0) * t.powf(1.0 / self.exponent)
    }
}

impl Negotiator for TimeBasedAgent {
    fn on_start(&mut self, space: &OutcomeSpace, ufun: Arc<dyn UtilityFunction>) {
        self.ranked = rank_outcomes(space, ufun.as_ref());
        self.ufun = Some(ufun);
    }

    fn propose(&mut self, time: f64) -> Option<Outcome> {
        let target = self.target(time);
        // Worst outcome still at or above target: concedes as little as needed.
        self.ranked
            .iter()
            .rev()
            .find(|(_, u)| *u >= target)
            .or_else(|| self.ranked.first())
            .map(|(o, _)| o.clone())
    }

    fn respond(&mut self, offer: &Outcome, time: f64) -> Response {
        let Some(ufun) = &self.ufun else {
            return Response::Reject;
        };
        match ufun.evaluate(offer) {
            Some(u) if u >= self.target(time) && u >= ufun.reserved_value() => Response::Accept,
            _ => Response::Reject,
        }
    }
}

/// Proposes random outcomes above its reserved value and accepts any such offer.
#[derive(Debug)]
pub struct RandomAgent {
    rng: StdRng,
    ufun: Option<Arc<dyn UtilityFunction>>,
    acceptable: Vec<Outcome>,
}

impl RandomAgent {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: rng_from_seed(seed),
            ufun: None,
            acceptable: Vec::new(),
        }
    }
}

impl Negotiator for RandomAgent {
    fn on_start(&mut self, space: &OutcomeSpace, ufun: Arc<dyn UtilityFunction>) {
        let reserve = ufun.reserved_value();
        self.acceptable = rank_outcomes(space, ufun.as_ref())
            .into_iter()
            .filter(|(_, u)| *u >= reserve)
            .map(|(o, _)| o)
            .collect();
        self.ufun = Some(ufun);
    }

    fn propose(&mut self, _time: f64) -> Option<Outcome> {
        if self.acceptable.is_empty() {
            return None;
        }
        let idx = self.rng.gen_range(0..self.acceptable.len());
        Some(self.acceptable[idx].clone())
    }

    fn respond(&mut self, offer: &Outcome, _time: f64) -> Response {
        match self.ufun.as_ref().and_then(|u| u.evaluate(offer).map(|v| (v, u.reserved_value()))) {
            Some((v, reserve)) if v >= reserve && self.rng.gen_bool(0.5) => Response::Accept,
            _ => Response::Reject,
        }
    }
}
