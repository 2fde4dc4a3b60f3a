//! Service deployer registry

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::engine::context::{BindContext, DeployContext, PreDeployContext, ServiceContext};
use crate::errors::WorkerError;

/// Capability set a per-type deployer must expose
#[async_trait]
pub trait ServiceDeployer: Send + Sync {
    /// Validate the spec; returns every problem found, no side effects
    fn check(&self, ctx: &ServiceContext) -> Vec<String>;

    /// Pre-deploy phase; independent of all other services
    async fn pre_deploy(&self, ctx: &ServiceContext) -> Result<PreDeployContext, WorkerError>;

    /// Bind phase; may read the deploy contexts of lower-level services
    async fn bind(
        &self,
        ctx: &ServiceContext,
        dependency_contexts: &HashMap<String, DeployContext>,
    ) -> Result<BindContext, WorkerError>;

    /// Deploy phase; may read all pre-deploy contexts and the deploy
    /// contexts of lower-level services
    async fn deploy(
        &self,
        ctx: &ServiceContext,
        pre_deploy_contexts: &HashMap<String, PreDeployContext>,
        dependency_contexts: &HashMap<String, DeployContext>,
    ) -> Result<DeployContext, WorkerError>;
}

/// Explicit type -> deployer lookup, injected into the engine.
///
/// Read-only shared state across all concurrent runs once built.
#[derive(Default)]
pub struct DeployerRegistry {
    deployers: HashMap<String, Arc<dyn ServiceDeployer>>,
}

impl DeployerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a deployer for a service type
    pub fn register(&mut self, service_type: &str, deployer: Arc<dyn ServiceDeployer>) {
        self.deployers.insert(service_type.to_string(), deployer);
    }

    /// Look up the deployer for a service type
    pub fn get(&self, service_type: &str) -> Option<&Arc<dyn ServiceDeployer>> {
        self.deployers.get(service_type)
    }

    /// Registered service types
    pub fn service_types(&self) -> Vec<&str> {
        self.deployers.keys().map(|t| t.as_str()).collect()
    }
}
