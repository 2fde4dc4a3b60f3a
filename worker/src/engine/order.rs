//! Deploy order computation
//!
//! Assigns every service the smallest level index such that all of its
//! dependencies sit in strictly lower levels. The leveling is therefore the
//! minimal one consistent with the dependency graph.

use std::collections::BTreeSet;

use crate::engine::context::EnvironmentContext;
use crate::errors::WorkerError;

/// Compute the leveled deploy order for an environment.
///
/// Returns the levels in execution order, service names sorted within each
/// level. A graph that admits no leveling is cyclic and is rejected naming
/// the services that could not be placed.
pub fn compute_deploy_order(env: &EnvironmentContext) -> Result<Vec<Vec<String>>, WorkerError> {
    let mut remaining: BTreeSet<&str> = env
        .service_contexts
        .keys()
        .map(|name| name.as_str())
        .collect();
    let mut placed: BTreeSet<&str> = BTreeSet::new();
    let mut levels: Vec<Vec<String>> = Vec::new();

    while !remaining.is_empty() {
        let ready: Vec<&str> = remaining
            .iter()
            .filter(|name| {
                let ctx = &env.service_contexts[**name];
                ctx.spec
                    .dependencies
                    .iter()
                    // Dependencies outside the environment are rejected by
                    // validation before ordering runs.
                    .filter(|dep| env.service_contexts.contains_key(*dep))
                    .all(|dep| placed.contains(dep.as_str()))
            })
            .copied()
            .collect();

        if ready.is_empty() {
            let stuck: Vec<&str> = remaining.iter().copied().collect();
            return Err(WorkerError::CyclicDependencyError(stuck.join(", ")));
        }

        for name in &ready {
            remaining.remove(name);
            placed.insert(*name);
        }
        levels.push(ready.into_iter().map(String::from).collect());
    }

    Ok(levels)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::*;
    use crate::models::spec::ServiceSpec;

    fn spec(deps: &[&str]) -> ServiceSpec {
        ServiceSpec {
            service_type: "script".to_string(),
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            tags: HashMap::new(),
            params: HashMap::new(),
        }
    }

    fn env(services: Vec<(&str, ServiceSpec)>) -> EnvironmentContext {
        let services = services
            .into_iter()
            .map(|(name, s)| (name.to_string(), s))
            .collect();
        EnvironmentContext::new("app", "pipeline", "dev", services, PathBuf::from("/tmp"))
    }

    #[test]
    fn test_independent_services_share_level_zero() {
        let env = env(vec![("a", spec(&[])), ("b", spec(&[]))]);
        let order = compute_deploy_order(&env).unwrap();
        assert_eq!(order, vec![vec!["a".to_string(), "b".to_string()]]);
    }

    #[test]
    fn test_dependency_forces_higher_level() {
        let env = env(vec![("a", spec(&[])), ("b", spec(&["a"]))]);
        let order = compute_deploy_order(&env).unwrap();
        assert_eq!(order.len(), 2);
        assert_eq!(order[0], vec!["a".to_string()]);
        assert_eq!(order[1], vec!["b".to_string()]);
    }

    #[test]
    fn test_minimal_leveling_for_diamond() {
        let env = env(vec![
            ("a", spec(&[])),
            ("b", spec(&["a"])),
            ("c", spec(&["a"])),
            ("d", spec(&["b", "c"])),
        ]);
        let order = compute_deploy_order(&env).unwrap();
        assert_eq!(order.len(), 3);
        assert_eq!(order[1], vec!["b".to_string(), "c".to_string()]);
        assert_eq!(order[2], vec!["d".to_string()]);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let env = env(vec![("a", spec(&["b"])), ("b", spec(&["a"]))]);
        let err = compute_deploy_order(&env).unwrap_err();
        match err {
            WorkerError::CyclicDependencyError(services) => {
                assert!(services.contains('a'));
                assert!(services.contains('b'));
            }
            other => panic!("Expected cyclic dependency error, got {}", other),
        }
    }

    #[test]
    fn test_empty_environment_has_no_levels() {
        let env = env(vec![]);
        let order = compute_deploy_order(&env).unwrap();
        assert!(order.is_empty());
    }
}
