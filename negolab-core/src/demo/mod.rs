//! Built-in demo Negotiation Engine.
//!
//! Small, deterministic stand-in for a full negotiation library: an
//! alternating-offers mechanism, a handful of time-based agents, two built-in
//! scenarios and TOML scenario files. Enough to run real tournaments from the
//! CLI and to exercise the scheduler end to end.

pub mod agents;
pub mod sao;
pub mod scenarios;
pub mod ufun;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::MechanismSpec;
use crate::domain::OutcomeSpace;
use crate::engine::{EngineError, Mechanism, NegotiationEngine, ResolvedParty, Scenario};
use crate::registry::CompetitorRegistry;

pub use agents::{RandomAgent, TimeBasedAgent};
pub use sao::SaoMechanism;
pub use scenarios::{ScenarioFile, BUILTIN_PREFIX};
pub use ufun::LinearAdditiveUtility;

/// Registry preloaded with the built-in agents.
pub fn builtin_registry() -> CompetitorRegistry {
    let mut registry = CompetitorRegistry::new();
    registry
        .register("boulware", "TimeBasedAgent(e=0.2)", |_| {
            Ok(Box::new(TimeBasedAgent::boulware()))
        })
        .register("linear", "TimeBasedAgent(e=1)", |_| {
            Ok(Box::new(TimeBasedAgent::linear()))
        })
        .register("conceder", "TimeBasedAgent(e=2)", |_| {
            Ok(Box::new(TimeBasedAgent::conceder()))
        })
        .register("hardliner", "TimeBasedAgent(e=0)", |_| {
            Ok(Box::new(TimeBasedAgent::hardliner()))
        })
        .register("random", "RandomAgent", |ctx| Ok(Box::new(RandomAgent::new(ctx.seed))));
    registry
}

#[derive(Debug, Clone)]
pub struct DemoEngine {
    registry: CompetitorRegistry,
    scenarios: HashMap<String, Arc<Scenario>>,
    master_seed: u64,
}

impl Default for DemoEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoEngine {
    pub fn new() -> Self {
        Self {
            registry: builtin_registry(),
            scenarios: HashMap::new(),
            master_seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.master_seed = seed;
        self
    }

    /// Make an in-memory scenario loadable under `path`.
    pub fn with_scenario(mut self, path: &str, scenario: Scenario) -> Self {
        self.scenarios.insert(path.to_string(), Arc::new(scenario));
        self
    }

    pub fn registry(&self) -> &CompetitorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CompetitorRegistry {
        &mut self.registry
    }
}

impl NegotiationEngine for DemoEngine {
    fn resolve_competitor_type(&self, name: &str) -> Option<ResolvedParty> {
        self.registry.resolve(name)
    }

    fn load_scenario(&self, path: &str) -> Option<Arc<Scenario>> {
        if let Some(s) = self.scenarios.get(path) {
            return Some(s.clone());
        }
        if let Some(name) = path.strip_prefix(BUILTIN_PREFIX) {
            return scenarios::builtin(name).map(Arc::new);
        }
        let p = Path::new(path);
        if p.extension().is_some_and(|e| e == "toml") {
            return scenarios::load_scenario_file(p).map(Arc::new);
        }
        None
    }

    fn build_mechanism(
        &self,
        outcome_space: &OutcomeSpace,
        spec: &MechanismSpec,
    ) -> Result<Box<dyn Mechanism>, EngineError> {
        match spec.mechanism_type.to_ascii_lowercase().as_str() {
            "sao" => {
                let n_steps = match spec.params.get("n_steps") {
                    None => sao::DEFAULT_STEPS,
                    Some(v) => v.as_u64().filter(|n| *n > 0).ok_or_else(|| {
                        EngineError::InvalidParameter {
                            name: "n_steps".into(),
                            reason: format!("expected a positive integer, got {v}"),
                        }
                    })?,
                };
                Ok(Box::new(SaoMechanism::new(outcome_space.clone(), n_steps)))
            }
            other => Err(EngineError::UnknownMechanism(other.to_string())),
        }
    }

    fn master_seed(&self) -> u64 {
        self.master_seed
    }
}
