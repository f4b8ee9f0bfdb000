/* Copyright (C) 2025 Pedro Henrique / phkaiser13
* File: src/blue_green.rs
*
* Object mutators used by the routers. Each function takes the object as it
* appears in the manifests and returns the rewritten copy; the input is never
* modified in place.
*
* Naming conventions:
* - The variant label `k8s.deploy.color` marks which workload an object
*   selects or routes to.
* - The green copy of a service `svc` is named `svc-<label>`, the blue copy is
*   `svc-stable`, and the TrafficSplit fronting it is `svc-trafficsplit`.
*
* SPDX-License-Identifier: Apache-2.0 */

use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::{Ingress, IngressBackend};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use tracing::debug;

use crate::cluster::Cluster;
use crate::error::Result;
use crate::objects::{TrafficSplit, TrafficSplitBackend, TrafficSplitSpec};

pub const VERSION_LABEL: &str = "k8s.deploy.color";
pub const STABLE_SUFFIX: &str = "-stable";
pub const TRAFFIC_SPLIT_SUFFIX: &str = "-trafficsplit";

const MAX_WEIGHT: u32 = 100;
const MIN_WEIGHT: u32 = 0;

/// Name of the green copy of a service.
pub fn green_service_name(name: &str, label: &str) -> String {
    format!("{}-{}", name, label)
}

pub fn stable_service_name(name: &str) -> String {
    format!("{}{}", name, STABLE_SUFFIX)
}

pub fn traffic_split_name(name: &str) -> String {
    format!("{}{}", name, TRAFFIC_SPLIT_SUFFIX)
}

fn backend_service_names(ingress: &Ingress) -> impl Iterator<Item = &str> {
    ingress
        .spec
        .iter()
        .flat_map(|spec| {
            spec.rules
                .iter()
                .flatten()
                .flat_map(|rule| rule.http.iter())
                .flat_map(|http| http.paths.iter())
                .map(|path| &path.backend)
                .chain(spec.default_backend.iter())
        })
        .filter_map(|backend| backend.service.as_ref())
        .map(|backend| backend.name.as_str())
}

/// An ingress takes part in blue-green routing when at least one of its
/// backends, rule or default, points at a service from the name map.
pub fn is_ingress_routed(ingress: &Ingress, service_name_map: &BTreeMap<String, String>) -> bool {
    backend_service_names(ingress).any(|name| service_name_map.contains_key(name))
}

fn set_version_label(metadata: &mut ObjectMeta, label: &str) {
    metadata
        .labels
        .get_or_insert_with(BTreeMap::new)
        .insert(VERSION_LABEL.to_string(), label.to_string());
}

fn redirect_backend(backend: &mut IngressBackend, service_name_map: &BTreeMap<String, String>) {
    if let Some(service) = backend.service.as_mut() {
        if let Some(green) = service_name_map.get(&service.name) {
            debug!("Redirecting ingress backend '{}' to '{}'", service.name, green);
            service.name = green.clone();
        }
    }
}

/// Returns a copy of the ingress whose mapped backends point at the green
/// services. Backends that are not in the map keep their target.
pub fn updated_ingress(
    ingress: &Ingress,
    service_name_map: &BTreeMap<String, String>,
    label: &str,
) -> Ingress {
    let mut updated = ingress.clone();
    set_version_label(&mut updated.metadata, label);

    if let Some(spec) = updated.spec.as_mut() {
        let paths = spec
            .rules
            .iter_mut()
            .flatten()
            .flat_map(|rule| rule.http.iter_mut())
            .flat_map(|http| http.paths.iter_mut());
        for path in paths {
            redirect_backend(&mut path.backend, service_name_map);
        }
        if let Some(backend) = spec.default_backend.as_mut() {
            redirect_backend(backend, service_name_map);
        }
    }
    updated
}

/// Returns a copy of the service selecting the workload labelled `label`.
pub fn updated_service(service: &Service, label: &str) -> Service {
    let mut updated = service.clone();
    set_version_label(&mut updated.metadata, label);
    updated
        .spec
        .get_or_insert_with(Default::default)
        .selector
        .get_or_insert_with(BTreeMap::new)
        .insert(VERSION_LABEL.to_string(), label.to_string());
    updated
}

/// Builds a TrafficSplit in front of `service` that sends all traffic to the
/// `label` variant.
pub fn traffic_split_for(api_version: &str, service: &Service, label: &str) -> TrafficSplit {
    let service_name = service.metadata.name.clone().unwrap_or_default();
    let metadata = ObjectMeta {
        name: Some(traffic_split_name(&service_name)),
        namespace: service.metadata.namespace.clone(),
        labels: Some(BTreeMap::from([(
            VERSION_LABEL.to_string(),
            label.to_string(),
        )])),
        ..Default::default()
    };
    let spec = TrafficSplitSpec {
        backends: vec![
            TrafficSplitBackend {
                service: stable_service_name(&service_name),
                weight: MIN_WEIGHT,
            },
            TrafficSplitBackend {
                service: green_service_name(&service_name, label),
                weight: MAX_WEIGHT,
            },
        ],
        service: service_name,
    };
    TrafficSplit::new(api_version, metadata, spec)
}

/// Reads the service from the cluster and builds its split. `api_version` is
/// resolved once per batch by the caller.
pub async fn build_traffic_split(
    cluster: &dyn Cluster,
    api_version: &str,
    service_name: &str,
    label: &str,
) -> Result<TrafficSplit> {
    let service = cluster.get_service(service_name).await?;
    Ok(traffic_split_for(api_version, &service, label))
}
