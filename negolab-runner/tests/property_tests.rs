//! Property tests for tournament invariants.
//!
//! Uses proptest to verify:
//! 1. Job count — enumeration length matches the closed form and `total()`
//! 2. Self-play exclusion — no job pairs a party with itself unless enabled
//! 3. Rotation invariance — a rotated job reports utilities per partner
//! 4. Ranking — ranks are 1..=n over scores sorted descending

use std::sync::Arc;

use proptest::prelude::*;

use negolab_core::demo::DemoEngine;
use negolab_core::{
    MechanismSpec, NegotiationEngine, NegotiationJob, NegotiationResult, ScoreMetric, ScoreStat,
    UtilityFunction,
};
use negolab_runner::{
    expected_total, NegotiationExecutor, PairingPlan, ScenarioSlot, ScoreAggregator,
};

// ── Strategies (proptest) ────────────────────────────────────────────

const AGENTS: [&str; 5] = ["boulware", "linear", "conceder", "hardliner", "random"];

fn arb_plan() -> impl Strategy<Value = PairingPlan> {
    (
        prop::sample::select(vec![2usize, 3, 5]),
        1usize..=3,
        prop::sample::select(vec![1usize, 3]),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(n_competitors, n_scenarios, n_repetitions, self_play, rotate_ufuns)| {
            PairingPlan {
                scenarios: (0..n_scenarios)
                    .map(|i| ScenarioSlot {
                        name: format!("s{i}"),
                        n_ufuns: 2,
                    })
                    .collect(),
                competitors: AGENTS[..n_competitors].iter().map(|s| s.to_string()).collect(),
                opponents: None,
                n_repetitions,
                rotate_ufuns,
                self_play,
            }
        })
}

fn arb_utilities() -> impl Strategy<Value = Vec<(usize, usize, Option<[f64; 2]>)>> {
    prop::collection::vec(
        (
            0usize..4,
            0usize..4,
            prop::option::weighted(0.8, (0.0..1.0_f64, 0.0..1.0_f64).prop_map(|(a, b)| [a, b])),
        ),
        0..40,
    )
}

// ── 1. Job Count ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn job_count_matches_closed_form(plan in arb_plan()) {
        let jobs: Vec<NegotiationJob> = plan.jobs().collect();
        let expected = expected_total(
            plan.scenarios.len(),
            plan.competitors.len(),
            plan.n_repetitions,
            plan.self_play,
            plan.rotate_ufuns,
        );
        prop_assert_eq!(jobs.len(), expected);
        prop_assert_eq!(plan.total(), expected);
    }

    // ── 2. Self-Play Exclusion ───────────────────────────────────────

    #[test]
    fn no_self_pairs_without_self_play(plan in arb_plan()) {
        let self_pairs = plan.jobs().filter(|j| j.competitor == j.opponent).count();
        if plan.self_play {
            let per_scenario = plan.competitors.len()
                * plan.n_repetitions
                * if plan.rotate_ufuns { 2 } else { 1 };
            prop_assert_eq!(self_pairs, per_scenario * plan.scenarios.len());
        } else {
            prop_assert_eq!(self_pairs, 0);
        }
    }

    #[test]
    fn rotated_jobs_follow_their_unrotated_twin(plan in arb_plan()) {
        let jobs: Vec<NegotiationJob> = plan.jobs().collect();
        if plan.rotate_ufuns {
            for pair in jobs.chunks(2) {
                prop_assert!(!pair[0].rotated);
                prop_assert!(pair[1].rotated);
                prop_assert_eq!(pair[0].partners(), pair[1].partners());
            }
        } else {
            prop_assert!(jobs.iter().all(|j| !j.rotated));
        }
    }
}

// ── 3. Rotation Invariance ───────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Whatever ufun a party holds, index k of utilities/advantages is the
    /// utility of partners[k] under the ufun it actually negotiated with.
    #[test]
    fn rotation_keeps_partner_indexing(
        a in 0usize..4,
        b in 0usize..4,
        rotated in any::<bool>(),
    ) {
        let engine: Arc<dyn NegotiationEngine> = Arc::new(DemoEngine::new());
        let scenario = engine.load_scenario("builtin:laptop").unwrap();
        let job = NegotiationJob {
            scenario: scenario.name.clone(),
            scenario_index: 0,
            competitor: AGENTS[a].to_string(),
            opponent: AGENTS[b].to_string(),
            repetition: 0,
            rotated,
        };
        let r: NegotiationResult =
            NegotiationExecutor::new(engine.clone(), MechanismSpec::default()).execute(&job, &scenario);
        prop_assert!(!r.has_error, "{:?}", r.error_details);
        prop_assert_eq!(r.partners.clone(), job.partners());
        if let (Some(agreement), Some(u)) = (&r.agreement, r.utilities) {
            let held = if rotated { [1, 0] } else { [0, 1] };
            for k in 0..2 {
                let expected = scenario.ufuns[held[k]].evaluate(agreement).unwrap();
                prop_assert!((u[k] - expected).abs() < 1e-12);
            }
        }
    }
}

// ── 4. Ranking ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn ranks_are_dense_and_sorted(samples in arb_utilities()) {
        let names = ["a", "b", "c", "d"];
        let mut agg = ScoreAggregator::with_competitors(names.iter().map(|n| (*n, "T")));
        for (i, j, utilities) in samples {
            let partners = [names[i].to_string(), names[j].to_string()];
            let mut result = NegotiationResult::failed("s", partners.clone(), false, 0, "x");
            if let Some(u) = utilities {
                result.has_error = false;
                result.error_details = None;
                result.utilities = Some(u);
                result.advantages = Some(negolab_core::domain::result::advantages_of(u));
            }
            agg.update(&partners, &result);
        }
        let scores = agg.finalize(ScoreMetric::Advantage, ScoreStat::Mean);
        prop_assert_eq!(scores.len(), 4);
        for (i, s) in scores.iter().enumerate() {
            prop_assert_eq!(s.rank, i + 1);
        }
        for w in scores.windows(2) {
            prop_assert!(w[0].score >= w[1].score);
        }
    }
}
