// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning dry run
//!
//! Declares the full stack from `PROVISION_*` environment variables, executes
//! it against the simulated provider, and prints the creation waves, the
//! run report, and the exported outputs as JSON.
//!
//! Run with: cargo run --bin provision-plan
//!
//! Useful variables:
//! - `PROVISION_PROJECT_NAME` (default: hello-eks)
//! - `PROVISION_REGION` (default: us-west-2)
//! - `PROVISION_ENABLE_LOAD_BALANCER_CONTROLLER` with `PROVISION_OIDC_THUMBPRINTS`
//! - `RUST_LOG` for log filtering

use anyhow::{Context, Result};
use cim_provisioning::{provision, SimulatedProvider, StackConfig};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = StackConfig::from_env().context("Invalid PROVISION_* configuration")?;
    info!(
        project = %config.project_name,
        stack = %config.stack_name,
        region = %config.region,
        "Planning stack"
    );

    let provider = Arc::new(SimulatedProvider::new(config.region.clone()));
    let run = provision(&config, provider)
        .await
        .context("Failed to provision stack")?;

    for (i, wave) in run.plan.waves().iter().enumerate() {
        println!("wave {i}: {}", wave.join(", "));
    }

    if !run.report.is_success() {
        for failure in run.report.failures() {
            warn!(%failure, "Resource did not provision");
        }
    }

    let summary = json!({
        "report": &run.report,
        "outputs": &run.outputs,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("Failed to render summary")?
    );

    run.report
        .into_result()
        .map(|_| ())
        .context("Provisioning finished with failures")
}
