/* Copyright (C) 2025 Pedro Henrique / phkaiser13
* File: src/router.rs
*
* This file implements the cutover itself: the strategy dispatcher and the
* three routers it can delegate to.
*
* Flow of `route_for_deploy`:
* 1. Wait for the configured stabilization buffer.
* 2. Classify the manifest files into a `ManifestBundle`.
* 3. Hand the relevant part of the bundle to exactly one router:
*    - `Ingress`       -> `route_ingress` (ingress backends rewritten)
*    - `ServiceMesh`   -> `route_mesh` (one TrafficSplit per service)
*    - anything else   -> `route_service` (service selectors rewritten)
* 4. The router submits its objects in one batch and returns them together
*    with the submission outcome.
*
* Nothing here locks the target. Two cutovers racing on the same objects must
* be serialized by the caller.
*
* SPDX-License-Identifier: Apache-2.0 */

use futures::future::try_join_all;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, info_span, Instrument};

use crate::apply::submit;
use crate::blue_green::{build_traffic_split, is_ingress_routed, updated_ingress, updated_service};
use crate::cluster::Cluster;
use crate::config::{RouteConfig, RouteStrategy};
use crate::error::Result;
use crate::manifest;
use crate::objects::{NetworkObject, RoutingResult};
use crate::wait::wait_for_stabilization;

/// Moves traffic to the green workload described by `manifest_files`.
pub async fn route_for_deploy<P: AsRef<Path>>(
    cluster: &dyn Cluster,
    manifest_files: &[P],
    config: &RouteConfig,
) -> Result<RoutingResult> {
    let span = info_span!("route_for_deploy", strategy = %config.strategy);
    async move {
        wait_for_stabilization(config.buffer_minutes).await;

        let bundle = manifest::classify(manifest_files, &config.green_label)?;
        let label = config.green_label.as_str();

        match config.strategy {
            RouteStrategy::Ingress => {
                route_ingress(cluster, &bundle.service_name_map, &bundle.ingresses, label).await
            }
            RouteStrategy::ServiceMesh => route_mesh(cluster, label, &bundle.services).await,
            RouteStrategy::LabelSelector => route_service(cluster, label, &bundle.services).await,
        }
    }
    .instrument(span)
    .await
}

/// Rewrites routed ingresses to the green services and passes the others
/// through untouched. Output order and length match the input.
pub async fn route_ingress(
    cluster: &dyn Cluster,
    service_name_map: &BTreeMap<String, String>,
    ingresses: &[Ingress],
    label: &str,
) -> Result<RoutingResult> {
    let span = info_span!("route_ingress", ingresses = ingresses.len());
    async move {
        let objects: Vec<NetworkObject> = ingresses
            .iter()
            .map(|ingress| {
                if is_ingress_routed(ingress, service_name_map) {
                    updated_ingress(ingress, service_name_map, label).into()
                } else {
                    debug!(
                        "unrouted ingress detected {}",
                        ingress.metadata.name.as_deref().unwrap_or_default()
                    );
                    ingress.clone().into()
                }
            })
            .collect();

        let submission = submit(cluster, &objects).await?;
        Ok(RoutingResult { submission, objects })
    }
    .instrument(span)
    .await
}

/// Re-applies the routed ingresses as they are, dropping the unrouted ones.
pub async fn route_ingress_unchanged(
    cluster: &dyn Cluster,
    service_name_map: &BTreeMap<String, String>,
    ingresses: &[Ingress],
) -> Result<RoutingResult> {
    let span = info_span!("route_ingress_unchanged", ingresses = ingresses.len());
    async move {
        let objects: Vec<NetworkObject> = ingresses
            .iter()
            .filter(|ingress| is_ingress_routed(ingress, service_name_map))
            .cloned()
            .map(NetworkObject::from)
            .collect();

        let submission = submit(cluster, &objects).await?;
        Ok(RoutingResult { submission, objects })
    }
    .instrument(span)
    .await
}

/// Points every service selector at `label`.
pub async fn route_service(
    cluster: &dyn Cluster,
    label: &str,
    services: &[Service],
) -> Result<RoutingResult> {
    let span = info_span!("route_service", services = services.len());
    async move {
        let objects: Vec<NetworkObject> = services
            .iter()
            .map(|service| updated_service(service, label).into())
            .collect();

        let submission = submit(cluster, &objects).await?;
        Ok(RoutingResult { submission, objects })
    }
    .instrument(span)
    .await
}

/// Builds one TrafficSplit per service, concurrently, and submits them once
/// all were built. The first construction failure aborts without submitting.
/// The TrafficSplit API version is resolved once for the whole batch.
pub async fn route_mesh(
    cluster: &dyn Cluster,
    label: &str,
    services: &[Service],
) -> Result<RoutingResult> {
    let span = info_span!("route_mesh", services = services.len());
    async move {
        let splits = if services.is_empty() {
            Vec::new()
        } else {
            let api_version = cluster.traffic_split_api_version().await?;
            let api_version = api_version.as_str();
            try_join_all(services.iter().map(|service| {
                let name = service.metadata.name.as_deref().unwrap_or_default();
                build_traffic_split(cluster, api_version, name, label)
            }))
            .await?
        };
        info!("Built {} TrafficSplit object(s)", splits.len());

        let objects: Vec<NetworkObject> = splits.into_iter().map(NetworkObject::from).collect();
        let submission = submit(cluster, &objects).await?;
        Ok(RoutingResult { submission, objects })
    }
    .instrument(span)
    .await
}
