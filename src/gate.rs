// Copyright © 2026 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Per-partition credential checks guarding namespace access.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Credential gate in front of each partition namespace.
//!
//! Each partition may enroll exactly one username. Secrets are kept as
//! SHA-256 digests and a login must match both fields.

use std::collections::BTreeMap;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{VolumeError, VolumeResult};

fn digest_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Username and secret digest enrolled for one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    username: String,
    secret_sha256: String,
}

impl Credential {
    /// Build a credential from a cleartext secret. Only the digest is kept.
    pub fn new(username: &str, secret: &str) -> Self {
        Self {
            username: username.to_owned(),
            secret_sha256: digest_secret(secret),
        }
    }

    /// Enrolled username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// True only when both the username and the secret match.
    pub fn matches(&self, username: &str, secret: &str) -> bool {
        self.username == username && self.secret_sha256 == digest_secret(secret)
    }
}

/// Single credential pair per partition.
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    credentials: BTreeMap<String, Credential>,
}

impl AccessGate {
    /// Gate over previously persisted credentials.
    pub fn new(credentials: BTreeMap<String, Credential>) -> Self {
        Self { credentials }
    }

    /// Whether `partition` has an enrolled credential.
    pub fn is_enrolled(&self, partition: &str) -> bool {
        self.credentials.contains_key(partition)
    }

    /// Enrolled credential of `partition`.
    pub fn credential(&self, partition: &str) -> Option<&Credential> {
        self.credentials.get(partition)
    }

    /// Enroll the one credential `partition` may have.
    pub fn enroll(&mut self, partition: &str, username: &str, secret: &str) -> VolumeResult<()> {
        if username.is_empty() || username.chars().any(char::is_whitespace) {
            return Err(VolumeError::InvalidName(username.to_owned()));
        }
        if self.credentials.contains_key(partition) {
            return Err(VolumeError::AlreadyExists(format!(
                "credential for partition {partition}"
            )));
        }
        self.credentials
            .insert(partition.to_owned(), Credential::new(username, secret));
        info!("enrolled '{username}' for partition '{partition}'");
        Ok(())
    }

    /// Check a login attempt. A partition without a credential rejects every
    /// attempt.
    pub fn login(&self, partition: &str, username: &str, secret: &str) -> VolumeResult<()> {
        match self.credentials.get(partition) {
            Some(credential) if credential.matches(username, secret) => Ok(()),
            Some(_) => {
                warn!("rejected login for '{username}' on partition '{partition}'");
                Err(VolumeError::InvalidCredential(partition.to_owned()))
            }
            None => {
                warn!("login on partition '{partition}' without enrolled credential");
                Err(VolumeError::InvalidCredential(partition.to_owned()))
            }
        }
    }

    /// Persistable view of the credential map.
    pub fn credentials(&self) -> &BTreeMap<String, Credential> {
        &self.credentials
    }
}
