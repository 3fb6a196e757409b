use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use harness::cluster::{self, ClusterHandle};
use harness::config::{self, ProvisionConfig};
use harness::stage::{run_with_teardown, Stage, StagePlan, StageRunner};
use harness::terraform::Terraform;
use harness::workload::{self, Helm};

// Poll budgets for the two-node scenario.
const NODE_READY_RETRIES: u32 = 40;
const NODE_READY_INTERVAL: Duration = Duration::from_secs(10);
const SERVICE_RETRIES: u32 = 20;
const SERVICE_INTERVAL: Duration = Duration::from_secs(5);
const PROBE_RETRIES: u32 = 30;
const PROBE_INTERVAL: Duration = Duration::from_secs(5);

const NODE_PORT: u16 = 30100;
const EXTERNAL_ADDRESS_TYPE: &str = "ExternalIP";

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting Cluster Deployer E2E Test");
    info!("==================================");

    let run_id = short_run_id();
    let mut provision = ProvisionConfig::from_env()
        .context("Failed to load provisioning configuration")?;
    provision.cluster_name = format!("{}-{}", provision.cluster_name, run_id);

    info!("Cluster name: {}", provision.cluster_name);
    info!("GCP project:  {}", provision.gcp_project_id);
    info!("Terraform:    {}", provision.terraform_dir.display());

    let runner = StageRunner::new(StagePlan::from_env());
    let terraform = Terraform::new();

    // Teardown is created here, before setup runs, so a failure in any later
    // stage still destroys the stack. It is awaited unconditionally.
    let teardown = runner.run(Stage::Teardown, || async {
        let saved = ProvisionConfig::load(&provision.terraform_dir)?;
        terraform.destroy(&saved).await?;
        config::clear_state(&saved.terraform_dir)?;
        anyhow::Ok(())
    });

    let lifecycle = run_lifecycle(&runner, &terraform, &provision, &run_id);

    run_with_teardown(lifecycle, teardown).await?;

    info!("✅ End-to-end test passed");
    Ok(())
}

async fn run_lifecycle(
    runner: &StageRunner,
    terraform: &Terraform,
    provision: &ProvisionConfig,
    run_id: &str,
) -> Result<()> {
    runner
        .run(Stage::Setup, || async {
            provision.save()?;
            terraform.init_and_apply(provision).await?;
            anyhow::Ok(())
        })
        .await?;

    // Cluster access comes from the persisted configuration, not the one in
    // memory, so a re-entered run picks up the parameters apply actually used.
    let saved = ProvisionConfig::load(&provision.terraform_dir)?;
    let kubeconfig = terraform.output(&saved, "kubeconfig").await?;
    let handle = ClusterHandle::from_kubeconfig(&kubeconfig, &saved.namespace)
        .await
        .context("Failed to build cluster access from terraform output")?;

    runner
        .run(Stage::ValidateNodeCount, || async {
            validate_node_count(&handle, &provision.terraform_dir).await
        })
        .await?;

    runner
        .run(Stage::ValidateService, || async {
            validate_service(&handle, run_id).await
        })
        .await?;

    Ok(())
}

/// Waits for every node to report ready, then checks the live node count
/// against the count persisted at setup.
async fn validate_node_count(handle: &ClusterHandle, terraform_dir: &Path) -> Result<()> {
    let saved = ProvisionConfig::load(terraform_dir)?;

    cluster::wait_for_ready_nodes(handle, NODE_READY_RETRIES, NODE_READY_INTERVAL).await?;

    let live = cluster::count_nodes(handle).await?;
    let requested = saved.node_count as usize;
    if live != requested {
        anyhow::bail!(
            "cluster reports {} nodes, persisted configuration requested {}",
            live,
            requested
        );
    }
    info!("Node count matches requested {}", requested);
    Ok(())
}

/// Deploys the nginx chart, waits for its NodePort service, and probes the
/// first node's external address. The release is removed whatever happens.
async fn validate_service(handle: &ClusterHandle, run_id: &str) -> Result<()> {
    let helm = Helm::new();
    let chart = chart_path();
    let release = format!("deployer-nginx-{}", run_id);
    let node_port = NODE_PORT.to_string();
    let overrides = [
        ("image.repo", "nginx"),
        ("image.tag", "1.8"),
        ("nodePort", node_port.as_str()),
    ];

    helm.install(handle, &release, &chart, &overrides).await?;

    let outcome = check_service(handle, &release).await;
    helm.delete(handle, &release).await;
    outcome
}

async fn check_service(handle: &ClusterHandle, release: &str) -> Result<()> {
    workload::wait_for_service_available(handle, release, SERVICE_RETRIES, SERVICE_INTERVAL)
        .await?;

    let service = cluster::get_service(handle, release).await?;
    let name = service.metadata.name.as_deref().unwrap_or_default();
    if name != release {
        anyhow::bail!("service name {} does not match release {}", name, release);
    }

    let address = cluster::node_address(handle, EXTERNAL_ADDRESS_TYPE).await?;
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to create HTTP client")?;

    workload::probe_external_reachability(
        &http,
        &address,
        NODE_PORT,
        PROBE_RETRIES,
        PROBE_INTERVAL,
        |status, _body| status == 200,
    )
    .await?;
    Ok(())
}

fn chart_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/nginx-chart")
}

fn short_run_id() -> String {
    uuid::Uuid::new_v4().to_string()[..8].to_string()
}
