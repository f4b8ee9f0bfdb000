/* Copyright (C) 2025 Pedro Henrique / phkaiser13
* File: src/testing.rs
*
* In-memory cluster and object builders shared by the unit tests.
*
* SPDX-License-Identifier: Apache-2.0 */

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::cluster::Cluster;
use crate::error::{Error, Result};
use crate::objects::{NetworkObject, ObjectOutcome, SubmissionResult};

pub(crate) struct FakeCluster {
    api_version: Option<String>,
    missing_services: BTreeSet<String>,
    rejected: BTreeSet<String>,
    unreachable: bool,
    service_lookups: AtomicUsize,
    version_lookups: AtomicUsize,
    batches: Mutex<Vec<Vec<NetworkObject>>>,
}

impl FakeCluster {
    pub(crate) fn new() -> Self {
        Self {
            api_version: Some("split.smi-spec.io/v1alpha3".to_string()),
            missing_services: BTreeSet::new(),
            rejected: BTreeSet::new(),
            unreachable: false,
            service_lookups: AtomicUsize::new(0),
            version_lookups: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn missing_service(mut self, name: &str) -> Self {
        self.missing_services.insert(name.to_string());
        self
    }

    pub(crate) fn without_smi(mut self) -> Self {
        self.api_version = None;
        self
    }

    pub(crate) fn rejecting(mut self, name: &str) -> Self {
        self.rejected.insert(name.to_string());
        self
    }

    pub(crate) fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub(crate) fn service_lookups(&self) -> usize {
        self.service_lookups.load(Ordering::SeqCst)
    }

    pub(crate) fn version_lookups(&self) -> usize {
        self.version_lookups.load(Ordering::SeqCst)
    }

    pub(crate) fn batches(&self) -> Vec<Vec<NetworkObject>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl Cluster for FakeCluster {
    fn namespace(&self) -> &str {
        "default"
    }

    async fn get_service(&self, name: &str) -> Result<Service> {
        self.service_lookups.fetch_add(1, Ordering::SeqCst);
        if self.unreachable || self.missing_services.contains(name) {
            return Err(Error::ClusterQuery(format!("service '{}' not found", name)));
        }
        Ok(service(name, &[("app", name)]))
    }

    async fn traffic_split_api_version(&self) -> Result<String> {
        self.version_lookups.fetch_add(1, Ordering::SeqCst);
        self.api_version
            .clone()
            .ok_or_else(|| Error::ClusterQuery("split.smi-spec.io is not served".to_string()))
    }

    async fn apply(&self, objects: &[NetworkObject]) -> Result<SubmissionResult> {
        if self.unreachable {
            return Err(Error::Apply("connection refused".to_string()));
        }
        self.batches.lock().unwrap().push(objects.to_vec());
        let outcomes = objects
            .iter()
            .map(|o| {
                if self.rejected.contains(o.name()) {
                    ObjectOutcome::rejected(o, "admission webhook denied the request")
                } else {
                    ObjectOutcome::applied(o)
                }
            })
            .collect();
        Ok(SubmissionResult { outcomes })
    }
}

pub(crate) fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub(crate) fn service(name: &str, selector: &[(&str, &str)]) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(labels(selector)),
            ports: Some(vec![ServicePort {
                port: 80,
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn service_backend(name: &str) -> IngressBackend {
    IngressBackend {
        service: Some(IngressServiceBackend {
            name: name.to_string(),
            port: Some(ServiceBackendPort {
                number: Some(80),
                ..Default::default()
            }),
        }),
        ..Default::default()
    }
}

pub(crate) fn ingress(name: &str, backends: &[&str]) -> Ingress {
    let paths = backends
        .iter()
        .map(|backend| HTTPIngressPath {
            path: Some(format!("/{}", backend)),
            path_type: "Prefix".to_string(),
            backend: service_backend(backend),
        })
        .collect();

    Ingress {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            rules: Some(vec![IngressRule {
                host: Some("example.com".to_string()),
                http: Some(HTTPIngressRuleValue { paths }),
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Ingress with no rules, only a default backend.
pub(crate) fn default_backend_ingress(name: &str, backend: &str) -> Ingress {
    Ingress {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            default_backend: Some(service_backend(backend)),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub(crate) fn name_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    labels(pairs)
}
