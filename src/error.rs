// Copyright © 2026 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Typed error surface shared by every cohvol component.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Error types for volume operations.

use std::fmt;
use std::io;

use thiserror::Error;

/// Kind of namespace object referenced by a [`VolumeError::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// A partition in the partition table.
    Partition,
    /// A directory inside a partition namespace.
    Directory,
    /// A file entry inside a partition namespace.
    File,
    /// Either a file or a directory.
    Entry,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ObjectKind::Partition => "partition",
            ObjectKind::Directory => "directory",
            ObjectKind::File => "file",
            ObjectKind::Entry => "entry",
        };
        f.write_str(label)
    }
}

/// Errors surfaced by the volume core.
#[derive(Debug, Error)]
pub enum VolumeError {
    /// A partition or namespace entry with this name already exists.
    #[error("'{0}' already exists")]
    AlreadyExists(String),
    /// The referenced object does not exist.
    #[error("{kind} '{name}' does not exist")]
    NotFound {
        /// What kind of object was looked up.
        kind: ObjectKind,
        /// Name that failed to resolve.
        name: String,
    },
    /// The entry exists but is a directory where a file was required.
    #[error("'{0}' is a directory, not a file")]
    NotAFile(String),
    /// The entry exists but is a file where a directory was required.
    #[error("'{0}' is a file, not a directory")]
    NotADirectory(String),
    /// Directory removal refused because children remain.
    #[error("directory '{0}' is not empty")]
    NotEmpty(String),
    /// Not enough free space in the volume or partition.
    #[error("not enough space: requested {requested} bytes, {available} available")]
    InsufficientSpace {
        /// Bytes asked for.
        requested: u64,
        /// Bytes that could still be handed out.
        available: u64,
    },
    /// A path component was missing or was not a directory.
    #[error("path '{0}' does not exist")]
    PathNotFound(String),
    /// Username or secret did not match the enrolled credential.
    #[error("invalid credentials for partition '{0}'")]
    InvalidCredential(String),
    /// A partition or entry name is not acceptable.
    #[error("invalid name '{0}'")]
    InvalidName(String),
    /// Backing store or record file I/O failed.
    #[error("storage i/o: {0}")]
    Io(#[from] io::Error),
    /// A persisted record could not be encoded.
    #[error("encode record: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    /// A persisted record could not be decoded.
    #[error("decode record: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    /// A persisted record decoded but violates a volume invariant.
    #[error("corrupt metadata: {0}")]
    Corrupt(String),
    /// Configuration could not be loaded or is inconsistent.
    #[error("config: {0}")]
    Config(String),
}

impl VolumeError {
    pub(crate) fn not_found(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn insufficient(requested: u64, available: u64) -> Self {
        Self::InsufficientSpace {
            requested,
            available,
        }
    }

    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt(message.into())
    }

    /// Whether the error comes from the storage medium rather than from a
    /// rejected request. Fatal errors leave memory and disk possibly out of
    /// step; rejected requests never mutate anything.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VolumeError::Io(_)
                | VolumeError::Encode(_)
                | VolumeError::Decode(_)
                | VolumeError::Corrupt(_)
        )
    }
}

/// Result alias used across the crate.
pub type VolumeResult<T> = Result<T, VolumeError>;
