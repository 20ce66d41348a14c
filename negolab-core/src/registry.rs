//! Competitor registry: name → factory lookup table.
//!
//! Competitor types are resolved by name at job-execution time. Names are
//! matched case-insensitively; the registered spelling is what reports show.

use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::{EngineError, Negotiator, PartyContext, PartyFactory, ResolvedParty};

#[derive(Clone, Default)]
pub struct CompetitorRegistry {
    entries: Vec<ResolvedParty>,
    index: HashMap<String, usize>,
}

impl CompetitorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`. Re-registering a name replaces it.
    pub fn register<F>(&mut self, name: &str, type_name: &str, factory: F) -> &mut Self
    where
        F: Fn(&PartyContext) -> Result<Box<dyn Negotiator>, EngineError> + Send + Sync + 'static,
    {
        let entry = ResolvedParty {
            name: name.to_string(),
            type_name: type_name.to_string(),
            factory: Arc::new(factory) as PartyFactory,
        };
        let key = name.to_ascii_lowercase();
        match self.index.get(&key) {
            Some(&idx) => self.entries[idx] = entry,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(entry);
            }
        }
        self
    }

    pub fn resolve(&self, name: &str) -> Option<ResolvedParty> {
        self.index
            .get(&name.trim().to_ascii_lowercase())
            .map(|&idx| self.entries[idx].clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Registered `(name, type_name)` pairs in registration order.
    pub fn names(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), e.type_name.as_str()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for CompetitorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Outcome, OutcomeSpace};
    use crate::engine::{Response, UtilityFunction};

    struct Silent;

    impl Negotiator for Silent {
        fn on_start(&mut self, _space: &OutcomeSpace, _ufun: Arc<dyn UtilityFunction>) {}
        fn propose(&mut self, _time: f64) -> Option<Outcome> {
            None
        }
        fn respond(&mut self, _offer: &Outcome, _time: f64) -> Response {
            Response::Reject
        }
    }

    fn registry() -> CompetitorRegistry {
        let mut r = CompetitorRegistry::new();
        r.register("Silent", "test.Silent", |_| Ok(Box::new(Silent)));
        r.register("broken", "test.Broken", |ctx| {
            Err(EngineError::Construction {
                name: ctx.name.clone(),
                reason: "always fails".into(),
            })
        });
        r
    }

    #[test]
    fn resolve_is_case_insensitive() {
        let r = registry();
        let party = r.resolve("silent").unwrap();
        assert_eq!(party.name, "Silent");
        assert_eq!(party.type_name, "test.Silent");
        assert!(r.contains(" SILENT "));
        assert!(r.resolve("missing").is_none());
    }

    #[test]
    fn factory_errors_surface_on_construct() {
        let r = registry();
        let ctx = PartyContext {
            name: "broken".into(),
            position: 0,
            seed: 1,
        };
        assert!(r.resolve("broken").unwrap().construct(&ctx).is_err());
    }

    #[test]
    fn reregistering_replaces_in_place() {
        let mut r = registry();
        r.register("silent", "test.Silent2", |_| Ok(Box::new(Silent)));
        assert_eq!(r.len(), 2);
        assert_eq!(r.names()[0], ("silent", "test.Silent2"));
    }
}
