use kube::Error as KubeError;
use thiserror::Error;

/// Failure modes of a deployer test run. External tool diagnostics are
/// carried verbatim so infra failures can be root-caused from the test log.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("terraform provisioning failed: {0}")]
    Provisioning(String),

    #[error("terraform teardown failed: {0}")]
    Teardown(String),

    #[error("cluster nodes not ready after {attempts} attempts: {detail}")]
    ClusterNotReady { attempts: u32, detail: String },

    #[error("helm deployment failed: {0}")]
    Deployment(String),

    #[error("service {service} not available after {attempts} attempts")]
    ServiceNotAvailable { service: String, attempts: u32 },

    #[error("no accepted response from {url} after {attempts} attempts")]
    Unreachable { url: String, attempts: u32 },

    #[error("node has no {0} address")]
    AddressNotFound(String),

    #[error("cannot load provisioning state: {0}")]
    ConfigurationLoad(String),

    #[error("kubeconfig error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] KubeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
