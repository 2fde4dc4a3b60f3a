//! Script service deployer
//!
//! Runs commands declared in the service params inside the staged bundle
//! directory. Params:
//!   - `deploy` (required): command run in the deploy phase
//!   - `pre_deploy`, `bind` (optional): commands for the earlier phases
//!   - `exports` (optional): environment variables exported to dependents
//!
//! Dependency deploy contexts are exposed to every command through their
//! exported environment variables.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::engine::context::{BindContext, DeployContext, PreDeployContext, ServiceContext};
use crate::engine::registry::ServiceDeployer;
use crate::errors::WorkerError;

/// Deployer for the `script` service type
#[derive(Default)]
pub struct ScriptDeployer;

impl ScriptDeployer {
    pub fn new() -> Self {
        Self
    }

    fn command_param(ctx: &ServiceContext, key: &str) -> Option<String> {
        ctx.spec
            .params
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    fn dependency_env(
        dependency_contexts: &HashMap<String, DeployContext>,
    ) -> HashMap<String, String> {
        let mut env = HashMap::new();
        for dep in dependency_contexts.values() {
            for (key, value) in &dep.environment_variables {
                env.insert(key.clone(), value.clone());
            }
        }
        env
    }
}

async fn run_command(
    service_name: &str,
    command: &str,
    working_dir: &Path,
    env: &HashMap<String, String>,
) -> Result<(), WorkerError> {
    debug!("Running command for service {}: {}", service_name, command);

    let status = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(working_dir)
        .envs(env)
        .status()
        .await
        .map_err(|e| {
            WorkerError::DeployerError(format!(
                "Service '{}': failed to run command: {}",
                service_name, e
            ))
        })?;

    if !status.success() {
        return Err(WorkerError::DeployerError(format!(
            "Service '{}': command exited with {}",
            service_name, status
        )));
    }

    Ok(())
}

#[async_trait]
impl ServiceDeployer for ScriptDeployer {
    fn check(&self, ctx: &ServiceContext) -> Vec<String> {
        let mut errors = Vec::new();
        match ctx.spec.params.get("deploy") {
            None => errors.push("the 'deploy' parameter is required".to_string()),
            Some(v) if !v.is_string() => {
                errors.push("the 'deploy' parameter must be a string".to_string())
            }
            Some(_) => {}
        }
        for key in ["pre_deploy", "bind"] {
            if let Some(v) = ctx.spec.params.get(key) {
                if !v.is_string() {
                    errors.push(format!("the '{}' parameter must be a string", key));
                }
            }
        }
        errors
    }

    async fn pre_deploy(&self, ctx: &ServiceContext) -> Result<PreDeployContext, WorkerError> {
        if let Some(command) = Self::command_param(ctx, "pre_deploy") {
            run_command(&ctx.service_name, &command, &ctx.working_dir, &HashMap::new()).await?;
        }
        Ok(PreDeployContext::new(&ctx.service_name))
    }

    async fn bind(
        &self,
        ctx: &ServiceContext,
        dependency_contexts: &HashMap<String, DeployContext>,
    ) -> Result<BindContext, WorkerError> {
        if let Some(command) = Self::command_param(ctx, "bind") {
            let env = Self::dependency_env(dependency_contexts);
            run_command(&ctx.service_name, &command, &ctx.working_dir, &env).await?;
        }
        Ok(BindContext::new(&ctx.service_name))
    }

    async fn deploy(
        &self,
        ctx: &ServiceContext,
        _pre_deploy_contexts: &HashMap<String, PreDeployContext>,
        dependency_contexts: &HashMap<String, DeployContext>,
    ) -> Result<DeployContext, WorkerError> {
        let command = Self::command_param(ctx, "deploy").ok_or_else(|| {
            WorkerError::DeployerError(format!(
                "Service '{}': missing 'deploy' parameter",
                ctx.service_name
            ))
        })?;

        let env = Self::dependency_env(dependency_contexts);
        run_command(&ctx.service_name, &command, &ctx.working_dir, &env).await?;

        let mut deploy_context = DeployContext::new(&ctx.service_name);
        if let Some(exports) = ctx.spec.params.get("exports").and_then(|v| v.as_object()) {
            for (key, value) in exports {
                if let Some(value) = value.as_str() {
                    deploy_context
                        .environment_variables
                        .insert(key.clone(), value.to_string());
                }
            }
        }

        info!("Deployed script service {}", ctx.service_name);
        Ok(deploy_context)
    }
}
