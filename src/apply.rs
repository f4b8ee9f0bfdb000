/* Copyright (C) 2025 Pedro Henrique / phkaiser13
* File: src/apply.rs
*
* This file contains the submission step of a cutover. `submit` hands the
* routers' output to the cluster handle as one batch and logs the outcome.
* `server_side_apply` is the Kubernetes implementation behind `KubeCluster`:
* each object is converted to a `DynamicObject`, its API resource is resolved
* through discovery, and it is applied with Server-Side Apply.
*
* Objects the API server refuses are recorded as rejected outcomes and the
* remaining objects are still attempted. Any other client failure (transport,
* authentication) aborts the submission.
*
* SPDX-License-Identifier: Apache-2.0 */

use kube::{
    api::{Api, DynamicObject, Patch, PatchParams},
    core::GroupVersionKind,
    discovery, Client,
};
use tracing::{info, warn};

use crate::cluster::Cluster;
use crate::error::{Error, Result};
use crate::objects::{NetworkObject, ObjectOutcome, SubmissionResult};

pub const FIELD_MANAGER: &str = "bluegreen-router";

/// Submits the objects to the cluster as a single batch.
pub async fn submit(cluster: &dyn Cluster, objects: &[NetworkObject]) -> Result<SubmissionResult> {
    info!(
        "Submitting {} object(s) to namespace '{}'",
        objects.len(),
        cluster.namespace()
    );

    let result = cluster.apply(objects).await?;

    for outcome in result.rejected() {
        warn!(
            kind = %outcome.kind,
            name = %outcome.name,
            "Object was not applied: {:?}",
            outcome.status
        );
    }
    info!(
        "Applied {}/{} object(s)",
        result.applied_count(),
        objects.len()
    );
    Ok(result)
}

pub(crate) async fn server_side_apply(
    client: &Client,
    default_namespace: &str,
    objects: &[NetworkObject],
) -> Result<SubmissionResult> {
    let params = PatchParams::apply(FIELD_MANAGER).force();
    let mut outcomes = Vec::with_capacity(objects.len());

    for object in objects {
        let dynamic = object.to_dynamic()?;
        let name = object.name();
        if name.is_empty() {
            return Err(Error::Apply(format!(
                "{} object is missing metadata.name",
                object.kind()
            )));
        }

        let gvk = group_version_kind(&dynamic)?;
        let (resource, capabilities) = match discovery::pinned_kind(client, &gvk).await {
            Ok(found) => found,
            Err(e) => {
                outcomes.push(rejected_or_fatal(object, e)?);
                continue;
            }
        };

        let api: Api<DynamicObject> = if capabilities.scope == discovery::Scope::Cluster {
            Api::all_with(client.clone(), &resource)
        } else {
            let namespace = object.namespace().unwrap_or(default_namespace);
            Api::namespaced_with(client.clone(), namespace, &resource)
        };

        info!("Applying {} '{}'", gvk.kind, name);
        match api.patch(name, &params, &Patch::Apply(&dynamic)).await {
            Ok(_) => outcomes.push(ObjectOutcome::applied(object)),
            Err(e) => outcomes.push(rejected_or_fatal(object, e)?),
        }
    }

    Ok(SubmissionResult { outcomes })
}

fn group_version_kind(object: &DynamicObject) -> Result<GroupVersionKind> {
    let types = object
        .types
        .as_ref()
        .ok_or_else(|| Error::Apply("object is missing apiVersion/kind".to_string()))?;
    let (group, version) = types
        .api_version
        .split_once('/')
        .unwrap_or(("", types.api_version.as_str()));
    Ok(GroupVersionKind::gvk(group, version, &types.kind))
}

/// API-level refusals are per-object; anything else fails the submission.
fn rejected_or_fatal(object: &NetworkObject, error: kube::Error) -> Result<ObjectOutcome> {
    match error {
        kube::Error::Api(response) => Ok(ObjectOutcome::rejected(object, response.message)),
        kube::Error::Discovery(e) => Ok(ObjectOutcome::rejected(object, e.to_string())),
        other => Err(Error::Apply(format!(
            "{} '{}': {}",
            object.kind(),
            object.name(),
            other
        ))),
    }
}
