use k8s_openapi::api::core::v1::{Node, Service};
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::HarnessError;

/// Cluster access scoped to one test run. The credential blob produced by
/// provisioning is written to a transient file that is removed when the
/// handle drops, on success and failure paths alike.
pub struct ClusterHandle {
    client: Client,
    namespace: String,
    credentials: NamedTempFile,
}

impl ClusterHandle {
    /// Builds a handle from a kubeconfig credential blob and a target
    /// namespace.
    pub async fn from_kubeconfig(blob: &str, namespace: &str) -> Result<Self, HarnessError> {
        let credentials = write_credentials(blob)?;
        let kubeconfig = Kubeconfig::from_yaml(blob)?;
        let config =
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
        let client = Client::try_from(config)?;
        Ok(Self {
            client,
            namespace: namespace.to_string(),
            credentials,
        })
    }

    /// Path of the transient credential file, for CLIs that take
    /// `--kubeconfig`.
    pub fn kubeconfig_path(&self) -> &Path {
        self.credentials.path()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn nodes(&self) -> Api<Node> {
        Api::all(self.client.clone())
    }

    fn services(&self) -> Api<Service> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }
}

/// Writes the credential blob to a transient file. The returned guard deletes
/// the file when dropped.
pub fn write_credentials(blob: &str) -> Result<NamedTempFile, HarnessError> {
    let mut file = NamedTempFile::new()?;
    file.write_all(blob.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Polls at a fixed interval until every node reports ready, up to
/// `max_retries` attempts. API errors during the poll count as failed
/// attempts rather than aborting the wait.
pub async fn wait_for_ready_nodes(
    handle: &ClusterHandle,
    max_retries: u32,
    interval: Duration,
) -> Result<(), HarnessError> {
    let api = handle.nodes();
    let mut last_seen = "no observation yet".to_string();
    for attempt in 1..=max_retries {
        match api.list(&ListParams::default()).await {
            Ok(nodes) if !nodes.items.is_empty() && nodes.items.iter().all(node_is_ready) => {
                info!(
                    "All {} nodes ready after {} attempt(s)",
                    nodes.items.len(),
                    attempt
                );
                return Ok(());
            }
            Ok(nodes) => {
                let ready = nodes.items.iter().filter(|node| node_is_ready(node)).count();
                last_seen = format!("{}/{} nodes ready", ready, nodes.items.len());
                debug!("Attempt {}/{}: {}", attempt, max_retries, last_seen);
            }
            Err(err) => {
                last_seen = format!("node list failed: {}", err);
                debug!("Attempt {}/{}: {}", attempt, max_retries, last_seen);
            }
        }
        if attempt < max_retries {
            tokio::time::sleep(interval).await;
        }
    }
    Err(HarnessError::ClusterNotReady {
        attempts: max_retries,
        detail: last_seen,
    })
}

/// Current number of nodes the cluster reports.
pub async fn count_nodes(handle: &ClusterHandle) -> Result<usize, HarnessError> {
    Ok(handle.nodes().list(&ListParams::default()).await?.items.len())
}

/// Address of the requested type on the first node. No fallback to other
/// nodes: a missing address type on that node is fatal.
pub async fn node_address(handle: &ClusterHandle, addr_type: &str) -> Result<String, HarnessError> {
    let nodes = handle.nodes().list(&ListParams::default()).await?;
    let first = nodes
        .items
        .first()
        .ok_or_else(|| HarnessError::AddressNotFound(addr_type.to_string()))?;
    address_of(first, addr_type).ok_or_else(|| HarnessError::AddressNotFound(addr_type.to_string()))
}

pub async fn get_service(handle: &ClusterHandle, name: &str) -> Result<Service, HarnessError> {
    Ok(handle.services().get(name).await?)
}

/// A node is ready when its `Ready` condition reports `True`.
pub fn node_is_ready(node: &Node) -> bool {
    node.status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .map(|conditions| {
            conditions
                .iter()
                .any(|condition| condition.type_ == "Ready" && condition.status == "True")
        })
        .unwrap_or(false)
}

/// Scans a node's address list for the requested type.
pub fn address_of(node: &Node, addr_type: &str) -> Option<String> {
    node.status
        .as_ref()?
        .addresses
        .as_ref()?
        .iter()
        .find(|addr| addr.type_ == addr_type)
        .map(|addr| addr.address.clone())
}

/// A service is available once it exposes at least one port; a NodePort
/// service additionally needs every port's node port assigned.
pub fn service_is_available(service: &Service) -> bool {
    let Some(spec) = service.spec.as_ref() else {
        return false;
    };
    let Some(ports) = spec.ports.as_ref() else {
        return false;
    };
    if ports.is_empty() {
        return false;
    }
    match spec.type_.as_deref() {
        Some("NodePort") => ports.iter().all(|port| port.node_port.is_some()),
        _ => true,
    }
}
