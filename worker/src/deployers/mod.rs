//! Built-in service deployers

pub mod script;

use std::sync::Arc;

use crate::engine::registry::DeployerRegistry;

/// Registry with the built-in service types registered
pub fn default_registry() -> DeployerRegistry {
    let mut registry = DeployerRegistry::new();
    registry.register("script", Arc::new(script::ScriptDeployer::new()));
    registry
}
