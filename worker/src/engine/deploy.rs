//! Deployment engine
//!
//! Turns one EnvironmentContext into one EnvironmentDeployResult:
//! validate everything, pre-deploy everything, compute the level schedule,
//! then bind and deploy level by level.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, error, info};

use crate::engine::context::{
    BindContext, DeployContext, EnvironmentContext, EnvironmentDeployResult, PreDeployContext,
    ServiceContext,
};
use crate::engine::fsm::{RunEvent, RunFsm};
use crate::engine::order;
use crate::engine::registry::{DeployerRegistry, ServiceDeployer};
use crate::errors::WorkerError;

/// Contexts accumulated by a successful run
struct RunOutputs {
    bind_contexts: HashMap<String, BindContext>,
    deploy_contexts: HashMap<String, DeployContext>,
}

/// Dependency-ordered deployment engine
pub struct DeploymentEngine {
    registry: Arc<DeployerRegistry>,
}

impl DeploymentEngine {
    /// Create a new engine over an injected deployer registry
    pub fn new(registry: Arc<DeployerRegistry>) -> Self {
        Self { registry }
    }

    /// Deploy one environment.
    ///
    /// Never propagates deployer failures; they are converted into a
    /// failure result so the caller always gets exactly one result.
    pub async fn deploy_environment(&self, env: &EnvironmentContext) -> EnvironmentDeployResult {
        info!(
            "Deploying environment {} of {}",
            env.environment_name, env.app_name
        );

        let mut fsm = RunFsm::new();
        match self.run(env, &mut fsm).await {
            Ok(outputs) => {
                if let Err(e) = fsm.process(RunEvent::Completed) {
                    debug!("Run FSM: {}", e);
                }
                info!("Deployed environment {}", env.environment_name);
                EnvironmentDeployResult::success(
                    format!("Deployed environment {}", env.environment_name),
                    outputs.bind_contexts,
                    outputs.deploy_contexts,
                )
            }
            Err(err) => {
                let message = err.to_string();
                if let Err(e) = fsm.process(RunEvent::RunFailed(message.clone())) {
                    debug!("Run FSM: {}", e);
                }
                error!(
                    "Deploy of environment {} failed: {}",
                    env.environment_name, message
                );
                EnvironmentDeployResult::failure(message)
            }
        }
    }

    async fn run(
        &self,
        env: &EnvironmentContext,
        fsm: &mut RunFsm,
    ) -> Result<RunOutputs, WorkerError> {
        // 1. Validate every service; aggregate all errors before aborting
        let errors = self.check_services(env);
        if !errors.is_empty() {
            return Err(WorkerError::ValidationError(format!(
                "Errors while checking deploy spec:\n{}",
                errors.join("\n")
            )));
        }
        fsm.process(RunEvent::ChecksPassed)
            .map_err(WorkerError::Internal)?;

        // 2. Pre-deploy every service concurrently
        let pre_deploy_contexts = self.pre_deploy_services(env).await?;
        fsm.process(RunEvent::PreDeployed)
            .map_err(WorkerError::Internal)?;

        // 3. Compute the level schedule
        let deploy_order = order::compute_deploy_order(env)?;
        debug!(
            "Deploy order for {}: {:?}",
            env.environment_name, deploy_order
        );
        fsm.process(RunEvent::OrderComputed)
            .map_err(WorkerError::Internal)?;

        // 4. Bind and deploy level by level
        self.bind_and_deploy(env, &pre_deploy_contexts, &deploy_order, fsm)
            .await
    }

    fn check_services(&self, env: &EnvironmentContext) -> Vec<String> {
        let mut errors = Vec::new();

        for name in env.service_names() {
            let ctx = &env.service_contexts[&name];

            match self.registry.get(&ctx.service_type) {
                None => errors.push(format!(
                    "Service '{}' declares unsupported service type '{}'",
                    name, ctx.service_type
                )),
                Some(deployer) => {
                    for err in deployer.check(ctx) {
                        errors.push(format!("Service '{}': {}", name, err));
                    }
                }
            }

            for dep in &ctx.spec.dependencies {
                if !env.service_contexts.contains_key(dep) {
                    errors.push(format!(
                        "Service '{}' depends on '{}', which is not declared in this environment",
                        name, dep
                    ));
                }
            }
        }

        errors
    }

    async fn pre_deploy_services(
        &self,
        env: &EnvironmentContext,
    ) -> Result<HashMap<String, PreDeployContext>, WorkerError> {
        let mut futs = Vec::new();
        for ctx in env.service_contexts.values() {
            let deployer = self.deployer_for(ctx)?;
            futs.push(async move {
                let pre = deployer.pre_deploy(ctx).await?;
                Ok::<_, WorkerError>((ctx.service_name.clone(), pre))
            });
        }

        let results = try_join_all(futs).await?;
        Ok(results.into_iter().collect())
    }

    async fn bind_and_deploy(
        &self,
        env: &EnvironmentContext,
        pre_deploy_contexts: &HashMap<String, PreDeployContext>,
        deploy_order: &[Vec<String>],
        fsm: &mut RunFsm,
    ) -> Result<RunOutputs, WorkerError> {
        let mut bind_contexts: HashMap<String, BindContext> = HashMap::new();
        let mut deploy_contexts: HashMap<String, DeployContext> = HashMap::new();

        for (level, services) in deploy_order.iter().enumerate() {
            debug!("Binding level {} ({} services)", level, services.len());
            let mut bind_futs = Vec::new();
            for name in services {
                let ctx = &env.service_contexts[name];
                let deployer = self.deployer_for(ctx)?;
                let lower_levels = &deploy_contexts;
                bind_futs.push(async move {
                    let bound = deployer.bind(ctx, lower_levels).await?;
                    Ok::<_, WorkerError>((ctx.service_name.clone(), bound))
                });
            }
            for (name, bound) in try_join_all(bind_futs).await? {
                bind_contexts.insert(name, bound);
            }
            fsm.process(RunEvent::LevelBound)
                .map_err(WorkerError::Internal)?;

            debug!("Deploying level {} ({} services)", level, services.len());
            let mut deploy_futs = Vec::new();
            for name in services {
                let ctx = &env.service_contexts[name];
                let deployer = self.deployer_for(ctx)?;
                let lower_levels = &deploy_contexts;
                deploy_futs.push(async move {
                    let deployed = deployer
                        .deploy(ctx, pre_deploy_contexts, lower_levels)
                        .await?;
                    Ok::<_, WorkerError>((ctx.service_name.clone(), deployed))
                });
            }
            // Results land in the map only after the whole level joins, so a
            // level never observes a sibling's deploy context.
            let level_results = try_join_all(deploy_futs).await?;
            for (name, deployed) in level_results {
                deploy_contexts.insert(name, deployed);
            }

            if level + 1 < deploy_order.len() {
                fsm.process(RunEvent::LevelDeployed)
                    .map_err(WorkerError::Internal)?;
            }
        }

        Ok(RunOutputs {
            bind_contexts,
            deploy_contexts,
        })
    }

    fn deployer_for(&self, ctx: &ServiceContext) -> Result<Arc<dyn ServiceDeployer>, WorkerError> {
        self.registry.get(&ctx.service_type).cloned().ok_or_else(|| {
            WorkerError::Internal(format!(
                "No deployer registered for type '{}'",
                ctx.service_type
            ))
        })
    }
}
