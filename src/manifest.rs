/* Copyright (C) 2025 Pedro Henrique / phkaiser13
* File: src/manifest.rs
*
* This file turns the manifest files of a deployment into the typed bundle the
* routers consume. Every file may hold several YAML documents. Documents are
* categorized by `kind`; Deployments, Services and Ingresses are deserialized
* into their `k8s-openapi` types here, so the routers never deal with
* loosely-typed objects.
*
* A Service is considered routed when its selector is a subset of the
* `matchLabels` of one of the Deployments in the same manifests. Only routed
* Services take part in the cutover and get an entry in the service name map.
*
* SPDX-License-Identifier: Apache-2.0 */

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::DynamicObject;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::blue_green::green_service_name;
use crate::error::{Error, Result};

/// The objects of a deployment, grouped by the role they play in a cutover.
#[derive(Debug, Clone, Default)]
pub struct ManifestBundle {
    /// Routed service name to the name of its green copy.
    pub service_name_map: BTreeMap<String, String>,
    pub ingresses: Vec<Ingress>,
    /// Routed services, in manifest order.
    pub services: Vec<Service>,
    pub deployments: Vec<Deployment>,
    pub unrouted_services: Vec<Service>,
    pub other_objects: Vec<DynamicObject>,
}

/// Reads and classifies the given manifest files.
pub fn classify<P: AsRef<Path>>(paths: &[P], green_label: &str) -> Result<ManifestBundle> {
    let mut bundle = ManifestBundle::default();
    let mut all_services = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let display = path.display().to_string();
        for document in read_documents(path)? {
            let kind = document
                .get("kind")
                .and_then(|k| k.as_str())
                .ok_or_else(|| Error::parse(&display, "document is missing 'kind'"))?
                .to_string();

            match kind.as_str() {
                "Deployment" => bundle.deployments.push(typed(&display, document)?),
                "Service" => all_services.push(named::<Service>(&display, document, &kind)?),
                "Ingress" => bundle.ingresses.push(named::<Ingress>(&display, document, &kind)?),
                _ => bundle.other_objects.push(typed(&display, document)?),
            }
        }
    }

    for service in all_services {
        if is_service_routed(&service, &bundle.deployments) {
            let name = service.metadata.name.clone().unwrap_or_default();
            bundle
                .service_name_map
                .insert(name.clone(), green_service_name(&name, green_label));
            bundle.services.push(service);
        } else {
            debug!(
                "Service '{}' does not select any deployment in the manifests",
                service.metadata.name.as_deref().unwrap_or_default()
            );
            bundle.unrouted_services.push(service);
        }
    }

    info!(
        "Classified manifests: {} deployment(s), {} routed service(s), {} unrouted service(s), {} ingress(es), {} other object(s)",
        bundle.deployments.len(),
        bundle.services.len(),
        bundle.unrouted_services.len(),
        bundle.ingresses.len(),
        bundle.other_objects.len()
    );
    Ok(bundle)
}

fn read_documents(path: &Path) -> Result<Vec<serde_json::Value>> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| Error::parse(&display, e))?;

    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(&content) {
        let value = serde_json::Value::deserialize(document).map_err(|e| Error::parse(&display, e))?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}

fn typed<T: DeserializeOwned>(path: &str, document: serde_json::Value) -> Result<T> {
    serde_json::from_value(document).map_err(|e| Error::parse(path, e))
}

fn named<T>(path: &str, document: serde_json::Value, kind: &str) -> Result<T>
where
    T: DeserializeOwned + kube::Resource,
{
    let object: T = typed(path, document)?;
    if object.meta().name.as_deref().map_or(true, str::is_empty) {
        return Err(Error::parse(path, format!("{} is missing metadata.name", kind)));
    }
    Ok(object)
}

/// True when the service selector is a subset of some deployment's matchLabels.
pub fn is_service_routed(service: &Service, deployments: &[Deployment]) -> bool {
    let Some(selector) = service.spec.as_ref().and_then(|s| s.selector.as_ref()) else {
        return false;
    };
    if selector.is_empty() {
        return false;
    }
    deployments.iter().any(|deployment| {
        deployment
            .spec
            .as_ref()
            .and_then(|spec| spec.selector.match_labels.as_ref())
            .is_some_and(|match_labels| {
                selector
                    .iter()
                    .all(|(key, value)| match_labels.get(key) == Some(value))
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MANIFEST: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: svc-a
spec:
  selector:
    matchLabels:
      app: svc-a
  template:
    metadata:
      labels:
        app: svc-a
    spec:
      containers:
        - name: app
          image: nginx
---
apiVersion: v1
kind: Service
metadata:
  name: svc-a
spec:
  selector:
    app: svc-a
  ports:
    - port: 80
---
apiVersion: v1
kind: Service
metadata:
  name: svc-orphan
spec:
  selector:
    app: nothing
---
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: web
spec:
  rules:
    - host: example.com
      http:
        paths:
          - path: /
            pathType: Prefix
            backend:
              service:
                name: svc-a
                port:
                  number: 80
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
data:
  key: value
"#;

    fn write_manifest(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_classify_groups_objects_by_kind() {
        let file = write_manifest(MANIFEST);

        let bundle = classify(&[file.path()], "green").unwrap();

        assert_eq!(bundle.deployments.len(), 1);
        assert_eq!(bundle.services.len(), 1);
        assert_eq!(bundle.services[0].metadata.name.as_deref(), Some("svc-a"));
        assert_eq!(bundle.unrouted_services.len(), 1);
        assert_eq!(bundle.ingresses.len(), 1);
        assert_eq!(bundle.other_objects.len(), 1);
        assert_eq!(
            bundle.service_name_map.get("svc-a"),
            Some(&"svc-a-green".to_string())
        );
        assert!(!bundle.service_name_map.contains_key("svc-orphan"));
    }

    #[test]
    fn test_classify_uses_the_given_label_for_green_names() {
        let file = write_manifest(MANIFEST);
        let bundle = classify(&[file.path()], "next").unwrap();
        assert_eq!(
            bundle.service_name_map.get("svc-a"),
            Some(&"svc-a-next".to_string())
        );
    }

    #[test]
    fn test_classify_skips_empty_documents() {
        let file = write_manifest("---\n---\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: c\n");
        let bundle = classify(&[file.path()], "green").unwrap();
        assert_eq!(bundle.other_objects.len(), 1);
    }

    #[test]
    fn test_classify_missing_file_is_parse_error() {
        let err = classify(&["/nonexistent/manifest.yaml"], "green").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_classify_rejects_malformed_documents() {
        let no_kind = write_manifest("apiVersion: v1\nmetadata:\n  name: x\n");
        assert!(matches!(
            classify(&[no_kind.path()], "green"),
            Err(Error::Parse { .. })
        ));

        let bad_yaml = write_manifest("kind: Service\nmetadata: [unclosed\n");
        assert!(matches!(
            classify(&[bad_yaml.path()], "green"),
            Err(Error::Parse { .. })
        ));

        let no_name = write_manifest("apiVersion: v1\nkind: Service\nmetadata: {}\n");
        assert!(matches!(
            classify(&[no_name.path()], "green"),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_service_without_selector_is_unrouted() {
        let service = Service::default();
        assert!(!is_service_routed(&service, &[]));
    }
}
