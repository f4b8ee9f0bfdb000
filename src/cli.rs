/* Copyright (C) 2025 Pedro Henrique / phkaiser13
 * File: src/cli.rs
 * This file defines the command-line interface of the `bluegreen-router`
 * binary using the `clap` crate. The flags map one-to-one onto `RouteConfig`;
 * alternatively a complete configuration can be loaded from a JSON file.
 * SPDX-License-Identifier: Apache-2.0 */

use bluegreen_router::config::{RouteConfig, RouteStrategy, DEFAULT_GREEN_LABEL};
use bluegreen_router::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Cuts live traffic over from the blue workload to the green one.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Wait for the buffer time, then route traffic to the green workload.
    Route(RouteArgs),

    /// Re-apply the already routed ingresses without rewriting them.
    Reassert(RouteArgs),
}

#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Manifest file describing the deployment. Repeat for several files.
    #[arg(long = "manifest", short = 'f')]
    pub manifests: Vec<PathBuf>,

    /// Routing strategy: `ingress`, `smi` or `service`. Unknown values use `service`.
    #[arg(long, default_value = "service")]
    pub strategy: String,

    /// Minutes to wait before routing traffic.
    #[arg(long, default_value_t = 0)]
    pub buffer_minutes: u64,

    /// Label value identifying the green workload.
    #[arg(long, default_value = DEFAULT_GREEN_LABEL)]
    pub green_label: String,

    /// Namespace objects without an explicit namespace are applied to.
    #[arg(long, short = 'n', default_value = "default")]
    pub namespace: String,

    /// JSON configuration file. Replaces all the flags above.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Path to a kubeconfig. Inferred from the environment when omitted.
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,
}

impl RouteArgs {
    pub fn to_config(&self) -> Result<RouteConfig> {
        let config = match &self.config {
            Some(path) => RouteConfig::from_file(path)?,
            None => RouteConfig {
                strategy: RouteStrategy::parse(&self.strategy),
                buffer_minutes: self.buffer_minutes,
                green_label: self.green_label.clone(),
                namespace: self.namespace.clone(),
                manifests: self.manifests.clone(),
            },
        };
        config.validate()?;
        Ok(config)
    }
}
