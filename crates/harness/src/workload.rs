use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cluster::{self, ClusterHandle};
use crate::process;
use crate::HarnessError;

/// Adapter over the helm CLI for installing and removing a packaged
/// workload release.
pub struct Helm {
    binary: String,
}

impl Default for Helm {
    fn default() -> Self {
        Self::new()
    }
}

impl Helm {
    pub fn new() -> Self {
        Self {
            binary: "helm".to_string(),
        }
    }

    /// Installs a release from the chart at `chart` with the given value
    /// overrides.
    pub async fn install(
        &self,
        handle: &ClusterHandle,
        release: &str,
        chart: &Path,
        overrides: &[(&str, &str)],
    ) -> Result<(), HarnessError> {
        info!("Installing release {} from {}", release, chart.display());
        let args = install_args(
            handle.kubeconfig_path(),
            handle.namespace(),
            release,
            chart,
            overrides,
        );
        let output = process::run(&self.binary, None, &args).await?;
        if !output.status.success() {
            return Err(HarnessError::Deployment(process::stderr_text(&output)));
        }
        Ok(())
    }

    /// Uninstalls a release. Best-effort: a failure here is logged, never
    /// propagated, so it cannot mask an earlier one.
    pub async fn delete(&self, handle: &ClusterHandle, release: &str) {
        let args = delete_args(handle.kubeconfig_path(), release);
        match process::run(&self.binary, None, &args).await {
            Ok(output) if output.status.success() => info!("Release {} removed", release),
            Ok(output) => warn!(
                "Failed to remove release {}: {}",
                release,
                process::stderr_text(&output)
            ),
            Err(err) => warn!("Failed to remove release {}: {}", release, err),
        }
    }
}

pub(crate) fn install_args(
    kubeconfig: &Path,
    namespace: &str,
    release: &str,
    chart: &Path,
    overrides: &[(&str, &str)],
) -> Vec<String> {
    let mut args = vec![
        "install".to_string(),
        chart.display().to_string(),
        "--name".to_string(),
        release.to_string(),
        "--kubeconfig".to_string(),
        kubeconfig.display().to_string(),
        "--namespace".to_string(),
        namespace.to_string(),
    ];
    for (key, value) in overrides {
        args.push("--set".to_string());
        args.push(format!("{}={}", key, value));
    }
    args
}

pub(crate) fn delete_args(kubeconfig: &Path, release: &str) -> Vec<String> {
    vec![
        "delete".to_string(),
        release.to_string(),
        "--purge".to_string(),
        "--kubeconfig".to_string(),
        kubeconfig.display().to_string(),
    ]
}

/// Polls until the named service exists and is schedulable, up to
/// `max_retries` attempts at a fixed interval.
pub async fn wait_for_service_available(
    handle: &ClusterHandle,
    release: &str,
    max_retries: u32,
    interval: Duration,
) -> Result<(), HarnessError> {
    for attempt in 1..=max_retries {
        match cluster::get_service(handle, release).await {
            Ok(service) if cluster::service_is_available(&service) => {
                info!("Service {} available after {} attempt(s)", release, attempt);
                return Ok(());
            }
            Ok(_) => debug!(
                "Attempt {}/{}: service {} exists but has no schedulable port",
                attempt, max_retries, release
            ),
            Err(err) => debug!("Attempt {}/{}: {}", attempt, max_retries, err),
        }
        if attempt < max_retries {
            tokio::time::sleep(interval).await;
        }
    }
    Err(HarnessError::ServiceNotAvailable {
        service: release.to_string(),
        attempts: max_retries,
    })
}

/// Issues repeated HTTP GETs against `http://address:port` until `accept`
/// approves a response. The first accepted response succeeds immediately
/// without consuming the remaining budget; connection errors count as failed
/// attempts.
pub async fn probe_external_reachability<F>(
    http: &reqwest::Client,
    address: &str,
    port: u16,
    max_retries: u32,
    interval: Duration,
    accept: F,
) -> Result<(), HarnessError>
where
    F: Fn(u16, &str) -> bool,
{
    let url = format!("http://{}:{}", address, port);
    for attempt in 1..=max_retries {
        match http.get(&url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                if accept(status, &body) {
                    info!(
                        "{} accepted with status {} after {} attempt(s)",
                        url, status, attempt
                    );
                    return Ok(());
                }
                debug!(
                    "Attempt {}/{}: {} returned status {}",
                    attempt, max_retries, url, status
                );
            }
            Err(err) => debug!("Attempt {}/{}: {} unreachable: {}", attempt, max_retries, url, err),
        }
        if attempt < max_retries {
            tokio::time::sleep(interval).await;
        }
    }
    Err(HarnessError::Unreachable {
        url,
        attempts: max_retries,
    })
}
