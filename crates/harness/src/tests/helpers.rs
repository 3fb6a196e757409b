use std::path::Path;

use crate::config::ProvisionConfig;

/// Configuration matching the standard two-node e2e scenario.
pub fn sample_config(terraform_dir: &Path) -> ProvisionConfig {
    ProvisionConfig {
        cluster_name: "e2etest-deployer-ab12cd34".to_string(),
        gcp_project_id: "development-252112".to_string(),
        location: "europe-west4-b".to_string(),
        machine_type: "n1-standard-1".to_string(),
        node_count: 2,
        namespace: "default".to_string(),
        terraform_dir: terraform_dir.to_path_buf(),
        no_color: true,
    }
}

/// Finds a `flag value` pair in a built argument list.
pub fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
    args.windows(2)
        .any(|pair| pair[0] == flag && pair[1] == value)
}
