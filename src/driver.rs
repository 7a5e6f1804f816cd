//! Batch compilation
//!
//! Compilation units share nothing, so each one is validated and merged on
//! its own scoped thread. A failing unit only fails its own outcome.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use tracing::{info, warn};

use crate::error::Result;
use crate::loader::CompilationUnit;
use crate::merge::Runner;
use crate::overrides::OverrideTarget;
use crate::schema::Product;

/// Settings for [`compile_all`]
#[derive(Debug, Clone)]
pub struct DriverSettings {
    pub target: OverrideTarget,
    /// Upper bound on units compiled at the same time (at least 1)
    pub max_parallel_units: usize,
}

impl DriverSettings {
    pub fn new(target: OverrideTarget, max_parallel_units: usize) -> Self {
        Self { target, max_parallel_units }
    }
}

/// Result of compiling one unit
#[derive(Debug)]
pub struct UnitOutcome {
    pub name: String,
    pub result: Result<Product>,
}

impl UnitOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Compile one unit
pub fn compile(unit: &CompilationUnit, target: &OverrideTarget) -> UnitOutcome {
    let result = Runner::build(&unit.api, &unit.overrides, target);
    match &result {
        Ok(merged) => info!(unit = %unit.name, resources = merged.resources.len(), "Compiled unit"),
        Err(e) => warn!(unit = %unit.name, code = %e.kind(), error = %e, "Unit failed"),
    }
    UnitOutcome { name: unit.name.clone(), result }
}

/// Compile every unit, returning outcomes in input order
pub fn compile_all(units: &[CompilationUnit], settings: &DriverSettings) -> Vec<UnitOutcome> {
    let workers = settings.max_parallel_units.max(1).min(units.len());
    let counter = AtomicUsize::new(0);

    info!(units = units.len(), workers, target = %settings.target.name, "Compiling units");

    let next = &counter;
    let target = &settings.target;

    let mut finished: Vec<(usize, UnitOutcome)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(move || {
                    let mut done = Vec::new();
                    loop {
                        let idx = next.fetch_add(1, Ordering::Relaxed);
                        let Some(unit) = units.get(idx) else { break };
                        done.push((idx, compile(unit, target)));
                    }
                    done
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| match handle.join() {
                Ok(done) => done,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    finished.sort_by_key(|(idx, _)| *idx);
    finished.into_iter().map(|(_, outcome)| outcome).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::overrides::{OverrideMap, ResourceOverride};
    use crate::schema::{Property, Resource};

    fn unit(name: &str, resource: &str) -> CompilationUnit {
        let api = Product::new(name)
            .with_resource(Resource::new("Disk").with_property(Property::string("size")));
        let overrides = OverrideMap::new().with_resource(resource, ResourceOverride::new());
        CompilationUnit::new(name, api, overrides)
    }

    #[test]
    fn test_failure_is_isolated() {
        let units = vec![unit("a", "Disk"), unit("b", "Dsik"), unit("c", "Disk")];
        let outcomes = compile_all(&units, &DriverSettings::new(OverrideTarget::default(), 2));

        let names: Vec<&str> = outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(outcomes[0].is_ok());
        assert!(outcomes[2].is_ok());
        match &outcomes[1].result {
            Err(e) => assert_eq!(e.kind(), ErrorKind::UnknownResource),
            other => panic!("Expected UnknownResource, got {:?}", other),
        }
    }

    #[test]
    fn test_no_units() {
        let outcomes = compile_all(&[], &DriverSettings::new(OverrideTarget::default(), 4));
        assert!(outcomes.is_empty());
    }
}
