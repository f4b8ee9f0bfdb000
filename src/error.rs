/* Copyright (C) 2025 Pedro Henrique / phkaiser13
* File: src/error.rs
*
* Error taxonomy for the routing core. Every collaborator failure is
* propagated unchanged to the caller; nothing in this crate retries.
*
* SPDX-License-Identifier: Apache-2.0 */

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to parse manifest '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("Cluster query failed: {0}")]
    ClusterQuery(String),

    #[error("Failed to apply objects: {0}")]
    Apply(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn parse(path: impl Into<String>, message: impl ToString) -> Self {
        Error::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
