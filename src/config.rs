/* Copyright (C) 2025 Pedro Henrique / phkaiser13
* File: src/config.rs
*
* This file defines the configuration consumed by the routing core. It can be
* deserialized from a JSON document (camelCase keys) or assembled by the CLI
* from its flags. The strategy string is parsed leniently: any value that is
* not recognized falls back to label-selector routing.
*
* SPDX-License-Identifier: Apache-2.0 */

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Label value the selector and ingress rewrites target by default.
pub const DEFAULT_GREEN_LABEL: &str = "green";

/// Upper bound for the stabilization buffer, in minutes.
pub const MAX_BUFFER_MINUTES: u64 = 300;

/// How live traffic is moved to the green workload.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(from = "String")]
pub enum RouteStrategy {
    /// Rewrite Ingress backends to the green services.
    Ingress,
    /// Create SMI TrafficSplit resources weighted fully to green.
    ServiceMesh,
    /// Rewrite Service selectors to the green label.
    #[default]
    LabelSelector,
}

impl RouteStrategy {
    /// Parses a strategy name. Never fails; unknown values select the default.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "ingress" => RouteStrategy::Ingress,
            "smi" | "service-mesh" | "servicemesh" => RouteStrategy::ServiceMesh,
            _ => RouteStrategy::LabelSelector,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteStrategy::Ingress => "ingress",
            RouteStrategy::ServiceMesh => "smi",
            RouteStrategy::LabelSelector => "service",
        }
    }
}

impl From<String> for RouteStrategy {
    fn from(value: String) -> Self {
        RouteStrategy::parse(&value)
    }
}

impl std::fmt::Display for RouteStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for a single cutover.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfig {
    #[serde(default)]
    pub strategy: RouteStrategy,
    #[serde(default)]
    pub buffer_minutes: u64,
    #[serde(default = "default_green_label")]
    pub green_label: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub manifests: Vec<PathBuf>,
}

fn default_green_label() -> String {
    DEFAULT_GREEN_LABEL.to_string()
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            strategy: RouteStrategy::default(),
            buffer_minutes: 0,
            green_label: default_green_label(),
            namespace: default_namespace(),
            manifests: Vec::new(),
        }
    }
}

impl RouteConfig {
    /// Loads a configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read '{}': {}", path.display(), e)))?;
        let config: RouteConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_minutes > MAX_BUFFER_MINUTES {
            return Err(Error::Config(format!(
                "buffer time must be between 0 and {} minutes, got {}",
                MAX_BUFFER_MINUTES, self.buffer_minutes
            )));
        }
        if self.green_label.trim().is_empty() {
            return Err(Error::Config("green label must not be empty".to_string()));
        }
        if self.manifests.is_empty() {
            return Err(Error::Config("at least one manifest file is required".to_string()));
        }
        Ok(())
    }
}
