use tracing::info;

use crate::config::ProvisionConfig;
use crate::process;
use crate::HarnessError;

/// Adapter over the terraform CLI. Apply and destroy are never retried;
/// a non-zero exit fails the stage with the tool's stderr attached.
pub struct Terraform {
    binary: String,
}

impl Default for Terraform {
    fn default() -> Self {
        Self::new()
    }
}

impl Terraform {
    pub fn new() -> Self {
        Self {
            binary: "terraform".to_string(),
        }
    }

    /// `terraform init` followed by `terraform apply` with the configured
    /// variable set.
    pub async fn init_and_apply(&self, config: &ProvisionConfig) -> Result<(), HarnessError> {
        info!("Initializing terraform in {}", config.terraform_dir.display());
        let output =
            process::run(&self.binary, Some(&config.terraform_dir), &init_args(config)).await?;
        if !output.status.success() {
            return Err(HarnessError::Provisioning(process::stderr_text(&output)));
        }

        info!("Applying terraform module for cluster {}", config.cluster_name);
        let output =
            process::run(&self.binary, Some(&config.terraform_dir), &apply_args(config)).await?;
        if !output.status.success() {
            return Err(HarnessError::Provisioning(process::stderr_text(&output)));
        }
        Ok(())
    }

    /// Reads a named output of the applied module.
    pub async fn output(&self, config: &ProvisionConfig, name: &str) -> Result<String, HarnessError> {
        let output =
            process::run(&self.binary, Some(&config.terraform_dir), &output_args(name)).await?;
        if !output.status.success() {
            return Err(HarnessError::Provisioning(process::stderr_text(&output)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    /// `terraform destroy` with the same variable set apply ran with. Safe to
    /// call after a partial apply.
    pub async fn destroy(&self, config: &ProvisionConfig) -> Result<(), HarnessError> {
        info!("Destroying terraform stack for cluster {}", config.cluster_name);
        let output =
            process::run(&self.binary, Some(&config.terraform_dir), &destroy_args(config)).await?;
        if !output.status.success() {
            return Err(HarnessError::Teardown(process::stderr_text(&output)));
        }
        Ok(())
    }
}

pub(crate) fn init_args(config: &ProvisionConfig) -> Vec<String> {
    let mut args = vec!["init".to_string(), "-input=false".to_string()];
    if config.no_color {
        args.push("-no-color".to_string());
    }
    args
}

pub(crate) fn apply_args(config: &ProvisionConfig) -> Vec<String> {
    let mut args = vec![
        "apply".to_string(),
        "-auto-approve".to_string(),
        "-input=false".to_string(),
    ];
    if config.no_color {
        args.push("-no-color".to_string());
    }
    args.extend(var_args(config));
    args
}

pub(crate) fn destroy_args(config: &ProvisionConfig) -> Vec<String> {
    let mut args = vec!["destroy".to_string(), "-auto-approve".to_string()];
    if config.no_color {
        args.push("-no-color".to_string());
    }
    args.extend(var_args(config));
    args
}

pub(crate) fn output_args(name: &str) -> Vec<String> {
    vec!["output".to_string(), "-raw".to_string(), name.to_string()]
}

fn var_args(config: &ProvisionConfig) -> Vec<String> {
    let mut args = Vec::new();
    for (key, value) in config.vars() {
        args.push("-var".to_string());
        args.push(format!("{}={}", key, value));
    }
    args
}
