/* Copyright (C) 2025 Pedro Henrique / phkaiser13
* File: src/main.rs
*
* Entry point of the `bluegreen-router` binary. It sets up `tracing`, parses
* the command line, connects to the cluster and runs the requested cutover.
* The process exits with an error when the cutover fails or when the cluster
* refused any of the submitted objects.
*
* SPDX-License-Identifier: Apache-2.0 */

use anyhow::{bail, Result};
use bluegreen_router::{
    manifest, route_for_deploy, route_ingress_unchanged, KubeCluster, RouteConfig, RoutingResult,
};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;

use cli::{Cli, Commands, RouteArgs};

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()?;
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
    }
    Ok(())
}

async fn connect(args: &RouteArgs, config: &RouteConfig) -> Result<KubeCluster> {
    Ok(KubeCluster::try_default(&config.namespace, args.kubeconfig.as_deref()).await?)
}

async fn run_route(args: RouteArgs) -> Result<RoutingResult> {
    let config = args.to_config()?;
    let cluster = connect(&args, &config).await?;
    info!(
        "Routing {} manifest(s) with strategy '{}'",
        config.manifests.len(),
        config.strategy
    );
    Ok(route_for_deploy(&cluster, config.manifests.as_slice(), &config).await?)
}

async fn run_reassert(args: RouteArgs) -> Result<RoutingResult> {
    let config = args.to_config()?;
    let cluster = connect(&args, &config).await?;
    let bundle = manifest::classify(config.manifests.as_slice(), &config.green_label)?;
    Ok(route_ingress_unchanged(&cluster, &bundle.service_name_map, &bundle.ingresses).await?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs)?;

    let result = match cli.command {
        Commands::Route(args) => run_route(args).await?,
        Commands::Reassert(args) => run_reassert(args).await?,
    };

    for outcome in &result.submission.outcomes {
        println!("{} '{}': {:?}", outcome.kind, outcome.name, outcome.status);
    }

    let rejected = result.submission.rejected().count();
    if rejected > 0 {
        bail!(
            "{} of {} object(s) were rejected by the cluster",
            rejected,
            result.objects.len()
        );
    }
    info!("Cutover complete: {} object(s) applied.", result.submission.applied_count());
    Ok(())
}
