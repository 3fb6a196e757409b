use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::HarnessError;

/// File holding the serialized provisioning configuration, keyed by the
/// terraform working directory it lives under.
const STATE_FILE: &str = ".deployer-state.json";

/// Parameters handed to the provisioning tool, loaded from environment
/// variables at setup and persisted so later stages (possibly separate
/// invocations) reconstruct the exact values apply ran with.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProvisionConfig {
    /// Name of the cluster to create. The run id suffix is appended by the
    /// caller before setup.
    #[serde(default = "default_cluster_name")]
    pub cluster_name: String,

    /// Target GCP project.
    #[serde(default = "default_gcp_project_id")]
    pub gcp_project_id: String,

    /// Zone the cluster is created in.
    #[serde(default = "default_location")]
    pub location: String,

    /// Machine type for cluster nodes.
    #[serde(default = "default_machine_type")]
    pub machine_type: String,

    /// Number of nodes requested. Validation compares the live cluster
    /// against this value as persisted at setup.
    #[serde(default = "default_node_count")]
    pub node_count: u32,

    /// Namespace workloads are deployed into.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Directory holding the terraform module definition.
    #[serde(default = "default_terraform_dir")]
    pub terraform_dir: PathBuf,

    /// Suppress colorized terraform output.
    #[serde(default = "default_no_color")]
    pub no_color: bool,
}

fn default_cluster_name() -> String { "e2etest-deployer".to_string() }
fn default_gcp_project_id() -> String { "development-252112".to_string() }
fn default_location() -> String { "europe-west4-b".to_string() }
fn default_machine_type() -> String { "n1-standard-1".to_string() }
fn default_node_count() -> u32 { 2 }
fn default_namespace() -> String { "default".to_string() }
fn default_terraform_dir() -> PathBuf { PathBuf::from("terraform") }
fn default_no_color() -> bool { true }

impl ProvisionConfig {
    /// Loads configuration from `DEPLOYER_`-prefixed environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("DEPLOYER_").from_env::<ProvisionConfig>()
    }

    /// Variable map passed to terraform as `-var` pairs.
    pub fn vars(&self) -> Vec<(&'static str, String)> {
        vec![
            ("cluster_name", self.cluster_name.clone()),
            ("gcp_project_id", self.gcp_project_id.clone()),
            ("location", self.location.clone()),
            ("machine_type", self.machine_type.clone()),
            ("node_count", self.node_count.to_string()),
        ]
    }

    /// Persists the configuration under the terraform working directory.
    pub fn save(&self) -> Result<(), HarnessError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|err| HarnessError::ConfigurationLoad(err.to_string()))?;
        std::fs::write(state_path(&self.terraform_dir), json)?;
        Ok(())
    }

    /// Reloads the configuration persisted at setup.
    pub fn load(dir: &Path) -> Result<Self, HarnessError> {
        let path = state_path(dir);
        let raw = std::fs::read_to_string(&path).map_err(|err| {
            HarnessError::ConfigurationLoad(format!("{}: {}", path.display(), err))
        })?;
        serde_json::from_str(&raw).map_err(|err| {
            HarnessError::ConfigurationLoad(format!("{}: {}", path.display(), err))
        })
    }
}

/// Location of the persisted state for a given terraform working directory.
pub fn state_path(dir: &Path) -> PathBuf {
    dir.join(STATE_FILE)
}

/// Removes the persisted state once teardown has destroyed the stack.
pub fn clear_state(dir: &Path) -> Result<(), HarnessError> {
    let path = state_path(dir);
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}
