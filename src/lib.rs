/* Copyright (C) 2025 Pedro Henrique / phkaiser13
* File: src/lib.rs
*
* This file is the main entry point for the `bluegreen_router` library, the
* traffic-cutover core of a blue-green deployment. Given the manifests of a
* freshly deployed green workload, it redirects live traffic to it with one of
* three strategies: rewriting Ingress backends, rewriting Service selectors,
* or creating SMI TrafficSplit resources.
*
* Module map:
* - `router`: strategy dispatcher (`route_for_deploy`) and the three routers.
* - `blue_green`: object mutators and the TrafficSplit builder.
* - `manifest`: manifest file classification into a `ManifestBundle`.
* - `cluster`: the `Cluster` handle trait and its kube-rs implementation.
* - `apply`: batch submission and Server-Side Apply.
* - `wait`: the pre-cutover stabilization buffer.
* - `config`, `objects`, `error`: configuration, value types, error taxonomy.
*
* SPDX-License-Identifier: Apache-2.0 */

pub mod apply;
pub mod blue_green;
pub mod cluster;
pub mod config;
pub mod error;
pub mod manifest;
pub mod objects;
pub mod router;
pub mod wait;

#[cfg(test)]
mod testing;

pub use cluster::{Cluster, KubeCluster};
pub use config::{RouteConfig, RouteStrategy};
pub use error::{Error, Result};
pub use manifest::ManifestBundle;
pub use objects::{NetworkObject, RoutingResult, SubmissionResult, TrafficSplit};
pub use router::{route_for_deploy, route_ingress, route_ingress_unchanged, route_mesh, route_service};
