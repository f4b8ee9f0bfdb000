/* Copyright (C) 2025 Pedro Henrique / phkaiser13
* File: src/cluster.rs
*
* This module provides the cluster handle the routers work against. The
* `Cluster` trait exposes exactly what the routing core needs from a cluster:
* looking up a Service, resolving the served SMI TrafficSplit API version, and
* applying a batch of routing objects. `KubeCluster` implements it on top of a
* `kube::Client`; tests use an in-memory implementation.
*
* SPDX-License-Identifier: Apache-2.0 */

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use kube::{
    api::Api,
    config::{KubeConfigOptions, Kubeconfig},
    discovery, Client, Config,
};
use std::path::Path;
use tracing::debug;

use crate::apply;
use crate::error::{Error, Result};
use crate::objects::{NetworkObject, SubmissionResult, TRAFFIC_SPLIT_GROUP};

/// A handle on the cluster a cutover targets.
#[async_trait]
pub trait Cluster: Send + Sync {
    /// Namespace objects without an explicit namespace are applied to.
    fn namespace(&self) -> &str;

    /// Reads a Service. A missing Service is a `ClusterQuery` error.
    async fn get_service(&self, name: &str) -> Result<Service>;

    /// Resolves the `apiVersion` to use for SMI TrafficSplit objects.
    async fn traffic_split_api_version(&self) -> Result<String>;

    /// Applies the objects in order, reporting one outcome per object.
    async fn apply(&self, objects: &[NetworkObject]) -> Result<SubmissionResult>;
}

#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
    namespace: String,
}

impl KubeCluster {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    /// Builds a client from an explicit kubeconfig, or from the inferred
    /// environment (in-cluster or `~/.kube/config`) when none is given.
    pub async fn try_default(namespace: &str, kubeconfig: Option<&Path>) -> Result<Self> {
        let config = match kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                    Error::Config(format!("failed to read kubeconfig '{}': {}", path.display(), e))
                })?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .map_err(|e| Error::Config(format!("invalid kubeconfig: {}", e)))?
            }
            None => Config::infer()
                .await
                .map_err(|e| Error::Config(format!("failed to infer Kubernetes config: {}", e)))?,
        };
        let client = Client::try_from(config)?;
        Ok(Self::new(client, namespace))
    }
}

#[async_trait]
impl Cluster for KubeCluster {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get_service(&self, name: &str) -> Result<Service> {
        let services: Api<Service> = Api::namespaced(self.client.clone(), &self.namespace);
        services
            .get_opt(name)
            .await
            .map_err(|e| Error::ClusterQuery(format!("failed to read service '{}': {}", name, e)))?
            .ok_or_else(|| {
                Error::ClusterQuery(format!(
                    "service '{}' not found in namespace '{}'",
                    name, self.namespace
                ))
            })
    }

    async fn traffic_split_api_version(&self) -> Result<String> {
        let group = discovery::group(&self.client, TRAFFIC_SPLIT_GROUP)
            .await
            .map_err(|e| {
                Error::ClusterQuery(format!(
                    "failed to discover API group '{}': {}",
                    TRAFFIC_SPLIT_GROUP, e
                ))
            })?;
        let version = group.preferred_version_or_latest();
        debug!("Resolved TrafficSplit version {}/{}", TRAFFIC_SPLIT_GROUP, version);
        Ok(format!("{}/{}", TRAFFIC_SPLIT_GROUP, version))
    }

    async fn apply(&self, objects: &[NetworkObject]) -> Result<SubmissionResult> {
        apply::server_side_apply(&self.client, &self.namespace, objects).await
    }
}
