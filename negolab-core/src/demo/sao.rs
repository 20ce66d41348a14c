//! Stacked alternating offers between two parties.
//!
//! Party 0 opens. On each step the party holding the turn responds to the
//! standing offer: accept ends the negotiation with that offer, end-negotiation
//! ends it without agreement, reject makes the responder propose next. The
//! negotiation times out after `n_steps` offers.

use std::sync::Arc;

use crate::domain::{Outcome, OutcomeSpace};
use crate::engine::{EngineError, Mechanism, Negotiator, Response, UtilityFunction};

pub const DEFAULT_STEPS: u64 = 100;

pub struct SaoMechanism {
    space: OutcomeSpace,
    n_steps: u64,
    parties: Vec<(Box<dyn Negotiator>, Arc<dyn UtilityFunction>)>,
}

impl SaoMechanism {
    pub fn new(space: OutcomeSpace, n_steps: u64) -> Self {
        Self {
            space,
            n_steps,
            parties: Vec::with_capacity(2),
        }
    }
}

impl Mechanism for SaoMechanism {
    fn add(
        &mut self,
        party: Box<dyn Negotiator>,
        ufun: Arc<dyn UtilityFunction>,
    ) -> Result<(), EngineError> {
        if self.parties.len() >= 2 {
            return Err(EngineError::TooManyParties { max: 2 });
        }
        self.parties.push((party, ufun));
        Ok(())
    }

    fn run(&mut self) -> Result<Option<Outcome>, EngineError> {
        if self.parties.len() != 2 {
            return Err(EngineError::NotEnoughParties {
                needed: 2,
                got: self.parties.len(),
            });
        }
        for (party, ufun) in self.parties.iter_mut() {
            party.on_start(&self.space, ufun.clone());
        }

        let steps = self.n_steps.max(1);
        let time_at = |step: u64| step as f64 / steps as f64;

        let Some(mut offer) = self.parties[0].0.propose(0.0) else {
            return Ok(None);
        };
        if !self.space.contains(&offer) {
            return Err(EngineError::Runtime(format!("party 0 offered {offer} outside the outcome space")));
        }

        let mut turn = 1;
        for step in 1..steps {
            let time = time_at(step);
            let responder = &mut self.parties[turn].0;
            match responder.respond(&offer, time) {
                Response::Accept => return Ok(Some(offer)),
                Response::EndNegotiation => return Ok(None),
                Response::Reject => {}
            }
            let Some(counter) = responder.propose(time) else {
                return Ok(None);
            };
            if !self.space.contains(&counter) {
                return Err(EngineError::Runtime(format!(
                    "party {turn} offered {counter} outside the outcome space"
                )));
            }
            offer = counter;
            turn = 1 - turn;
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::agents::TimeBasedAgent;
    use crate::demo::scenarios::pie;

    fn run_pair(a: TimeBasedAgent, b: TimeBasedAgent, n_steps: u64) -> Option<Outcome> {
        let scenario = pie();
        let mut mech = SaoMechanism::new(scenario.outcome_space.clone(), n_steps);
        mech.add(Box::new(a), scenario.ufuns[0].clone()).unwrap();
        mech.add(Box::new(b), scenario.ufuns[1].clone()).unwrap();
        mech.run().unwrap()
    }

    #[test]
    fn two_hardliners_never_agree() {
        assert!(run_pair(TimeBasedAgent::hardliner(), TimeBasedAgent::hardliner(), 50).is_none());
    }

    #[test]
    fn conceders_reach_agreement() {
        let agreement = run_pair(TimeBasedAgent::conceder(), TimeBasedAgent::conceder(), 100);
        assert!(agreement.is_some());
    }

    #[test]
    fn third_party_rejected() {
        let scenario = pie();
        let mut mech = SaoMechanism::new(scenario.outcome_space.clone(), 10);
        for _ in 0..2 {
            mech.add(Box::new(TimeBasedAgent::linear()), scenario.ufuns[0].clone()).unwrap();
        }
        let err = mech
            .add(Box::new(TimeBasedAgent::linear()), scenario.ufuns[0].clone())
            .unwrap_err();
        assert_eq!(err, EngineError::TooManyParties { max: 2 });
    }

    #[test]
    fn run_with_one_party_fails() {
        let scenario = pie();
        let mut mech = SaoMechanism::new(scenario.outcome_space.clone(), 10);
        mech.add(Box::new(TimeBasedAgent::linear()), scenario.ufuns[0].clone()).unwrap();
        assert!(matches!(mech.run(), Err(EngineError::NotEnoughParties { .. })));
    }
}
