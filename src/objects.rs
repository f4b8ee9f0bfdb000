/* Copyright (C) 2025 Pedro Henrique / phkaiser13
* File: src/objects.rs
*
* This file defines the closed set of network-routing objects the routers
* produce and the submitter applies, together with the value types returned
* from a routing operation.
*
* Architecture:
* - `NetworkObject` wraps the typed `k8s-openapi` resources (Ingress, Service)
*   and the SMI `TrafficSplit`, which has no typed binding because its API
*   version is resolved from the cluster at runtime.
* - `SubmissionResult` carries one outcome per submitted object, in order.
* - `RoutingResult` pairs the submission outcome with the objects submitted.
*
* SPDX-License-Identifier: Apache-2.0 */

use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::DynamicObject;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const TRAFFIC_SPLIT_KIND: &str = "TrafficSplit";
pub const TRAFFIC_SPLIT_GROUP: &str = "split.smi-spec.io";

/// SMI TrafficSplit resource.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrafficSplit {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: TrafficSplitSpec,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrafficSplitSpec {
    /// The root service clients address.
    pub service: String,
    pub backends: Vec<TrafficSplitBackend>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrafficSplitBackend {
    pub service: String,
    pub weight: u32,
}

impl TrafficSplit {
    pub fn new(api_version: impl Into<String>, metadata: ObjectMeta, spec: TrafficSplitSpec) -> Self {
        Self {
            api_version: api_version.into(),
            kind: TRAFFIC_SPLIT_KIND.to_string(),
            metadata,
            spec,
        }
    }

    /// Name of the service this split fronts.
    pub fn root_service(&self) -> &str {
        &self.spec.service
    }

    pub fn total_weight(&self) -> u32 {
        self.spec.backends.iter().map(|b| b.weight).sum()
    }

    pub fn weight_of(&self, backend: &str) -> Option<u32> {
        self.spec
            .backends
            .iter()
            .find(|b| b.service == backend)
            .map(|b| b.weight)
    }
}

/// A routing object produced by one of the routers.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum NetworkObject {
    Ingress(Ingress),
    Service(Service),
    TrafficSplit(TrafficSplit),
}

impl NetworkObject {
    pub fn kind(&self) -> &str {
        match self {
            NetworkObject::Ingress(_) => "Ingress",
            NetworkObject::Service(_) => "Service",
            NetworkObject::TrafficSplit(ts) => ts.kind.as_str(),
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            NetworkObject::Ingress(i) => &i.metadata,
            NetworkObject::Service(s) => &s.metadata,
            NetworkObject::TrafficSplit(ts) => &ts.metadata,
        }
    }

    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata().namespace.as_deref()
    }

    pub fn as_ingress(&self) -> Option<&Ingress> {
        match self {
            NetworkObject::Ingress(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_service(&self) -> Option<&Service> {
        match self {
            NetworkObject::Service(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_traffic_split(&self) -> Option<&TrafficSplit> {
        match self {
            NetworkObject::TrafficSplit(ts) => Some(ts),
            _ => None,
        }
    }

    /// Converts the object into an untyped form for server-side apply.
    pub fn to_dynamic(&self) -> Result<DynamicObject> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::from_value(value)?)
    }
}

impl From<Ingress> for NetworkObject {
    fn from(ingress: Ingress) -> Self {
        NetworkObject::Ingress(ingress)
    }
}

impl From<Service> for NetworkObject {
    fn from(service: Service) -> Self {
        NetworkObject::Service(service)
    }
}

impl From<TrafficSplit> for NetworkObject {
    fn from(split: TrafficSplit) -> Self {
        NetworkObject::TrafficSplit(split)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectStatus {
    Applied,
    Rejected(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectOutcome {
    pub kind: String,
    pub name: String,
    pub status: ObjectStatus,
}

impl ObjectOutcome {
    pub fn applied(object: &NetworkObject) -> Self {
        Self {
            kind: object.kind().to_string(),
            name: object.name().to_string(),
            status: ObjectStatus::Applied,
        }
    }

    pub fn rejected(object: &NetworkObject, reason: impl Into<String>) -> Self {
        Self {
            kind: object.kind().to_string(),
            name: object.name().to_string(),
            status: ObjectStatus::Rejected(reason.into()),
        }
    }

    pub fn is_applied(&self) -> bool {
        self.status == ObjectStatus::Applied
    }
}

/// Per-object outcome of a submission, in submission order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmissionResult {
    pub outcomes: Vec<ObjectOutcome>,
}

impl SubmissionResult {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(ObjectOutcome::is_applied)
    }

    pub fn rejected(&self) -> impl Iterator<Item = &ObjectOutcome> {
        self.outcomes.iter().filter(|o| !o.is_applied())
    }

    pub fn applied_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_applied()).count()
    }
}

/// Result of a routing operation.
#[derive(Clone, Debug)]
pub struct RoutingResult {
    pub submission: SubmissionResult,
    pub objects: Vec<NetworkObject>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::ServiceSpec;

    fn split() -> TrafficSplit {
        TrafficSplit::new(
            "split.smi-spec.io/v1alpha3",
            ObjectMeta {
                name: Some("svc-a-trafficsplit".to_string()),
                ..Default::default()
            },
            TrafficSplitSpec {
                service: "svc-a".to_string(),
                backends: vec![
                    TrafficSplitBackend { service: "svc-a-stable".to_string(), weight: 0 },
                    TrafficSplitBackend { service: "svc-a-green".to_string(), weight: 100 },
                ],
            },
        )
    }

    #[test]
    fn test_traffic_split_serializes_smi_shape() {
        let value = serde_json::to_value(NetworkObject::from(split())).unwrap();
        assert_eq!(value["apiVersion"], "split.smi-spec.io/v1alpha3");
        assert_eq!(value["kind"], "TrafficSplit");
        assert_eq!(value["spec"]["service"], "svc-a");
        assert_eq!(value["spec"]["backends"][1]["weight"], 100);
    }

    #[test]
    fn test_traffic_split_weights() {
        let ts = split();
        assert_eq!(ts.total_weight(), 100);
        assert_eq!(ts.weight_of("svc-a-green"), Some(100));
        assert_eq!(ts.weight_of("svc-a-stable"), Some(0));
        assert_eq!(ts.weight_of("svc-b"), None);
    }

    #[test]
    fn test_service_to_dynamic_keeps_type_meta() {
        let service = Service {
            metadata: ObjectMeta {
                name: Some("svc-a".to_string()),
                namespace: Some("prod".to_string()),
                ..Default::default()
            },
            spec: Some(ServiceSpec::default()),
            ..Default::default()
        };
        let object = NetworkObject::from(service);
        assert_eq!(object.kind(), "Service");
        assert_eq!(object.name(), "svc-a");
        assert_eq!(object.namespace(), Some("prod"));

        let dynamic = object.to_dynamic().unwrap();
        let types = dynamic.types.unwrap();
        assert_eq!(types.api_version, "v1");
        assert_eq!(types.kind, "Service");
        assert_eq!(dynamic.metadata.name.as_deref(), Some("svc-a"));
    }

    #[test]
    fn test_submission_result_success_and_rejections() {
        let a = NetworkObject::from(split());
        let result = SubmissionResult {
            outcomes: vec![
                ObjectOutcome::applied(&a),
                ObjectOutcome::rejected(&a, "forbidden"),
            ],
        };
        assert!(!result.is_success());
        assert_eq!(result.applied_count(), 1);
        assert_eq!(result.rejected().count(), 1);
        assert!(SubmissionResult::default().is_success());
    }
}
