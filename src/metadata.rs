// Copyright © 2026 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Durable MessagePack records for volume metadata and credentials.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Persisted records.
//!
//! Two independent records are kept: the volume metadata (partition table
//! plus namespace tree) and the credential map. Each is rewritten in full
//! after every mutation. Records are MessagePack with named fields wrapped in
//! a versioned envelope.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{VolumeError, VolumeResult};
use crate::gate::Credential;
use crate::namespace::NamespaceTree;
use crate::partition::PartitionTable;

/// Envelope version written by this build.
pub const RECORD_VERSION: u32 = 1;

/// Where a record lives.
#[derive(Debug, Clone)]
pub enum RecordSlot {
    /// Host file rewritten on every save.
    File(PathBuf),
    /// In-process buffer holding the last encoded bytes.
    Memory(Option<Vec<u8>>),
}

impl RecordSlot {
    /// Slot backed by a host file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Empty in-memory slot.
    pub fn memory() -> Self {
        Self::Memory(None)
    }

    /// Last saved bytes, `None` if nothing was saved yet.
    pub fn bytes(&self) -> VolumeResult<Option<Vec<u8>>> {
        match self {
            RecordSlot::File(path) => match fs::read(path) {
                Ok(bytes) => Ok(Some(bytes)),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(err) => Err(err.into()),
            },
            RecordSlot::Memory(bytes) => Ok(bytes.clone()),
        }
    }

    fn store(&mut self, bytes: Vec<u8>) -> VolumeResult<()> {
        match self {
            RecordSlot::File(path) => {
                fs::write(&*path, &bytes)?;
                debug!("wrote {} record bytes to {}", bytes.len(), path.display());
            }
            RecordSlot::Memory(slot) => *slot = Some(bytes),
        }
        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        match self {
            RecordSlot::File(path) => Some(path),
            RecordSlot::Memory(_) => None,
        }
    }
}

fn check_version(version: u32) -> VolumeResult<()> {
    if version != RECORD_VERSION {
        return Err(VolumeError::corrupt(format!(
            "unsupported record version {version}"
        )));
    }
    Ok(())
}

#[derive(Serialize)]
struct MetadataRef<'a> {
    version: u32,
    partitions: &'a PartitionTable,
    namespaces: &'a NamespaceTree,
}

#[derive(Deserialize)]
struct MetadataOwned {
    version: u32,
    partitions: PartitionTable,
    namespaces: NamespaceTree,
}

/// Encode the partition table and namespace tree as one record.
pub fn encode_metadata(table: &PartitionTable, tree: &NamespaceTree) -> VolumeResult<Vec<u8>> {
    let record = MetadataRef {
        version: RECORD_VERSION,
        partitions: table,
        namespaces: tree,
    };
    Ok(rmp_serde::to_vec_named(&record)?)
}

/// Decode a metadata record and check it against a volume of `capacity`
/// bytes.
pub fn decode_metadata(
    bytes: &[u8],
    capacity: u64,
) -> VolumeResult<(PartitionTable, NamespaceTree)> {
    let record: MetadataOwned = rmp_serde::from_slice(bytes)?;
    check_version(record.version)?;
    validate(&record.partitions, &record.namespaces, capacity)?;
    Ok((record.partitions, record.namespaces))
}

fn validate(table: &PartitionTable, tree: &NamespaceTree, capacity: u64) -> VolumeResult<()> {
    table.validate(capacity)?;
    let roots: Vec<&str> = tree.partitions().collect();
    let names: Vec<&str> = table.iter().map(|p| p.name()).collect();
    if roots != names {
        return Err(VolumeError::corrupt(format!(
            "namespace roots {roots:?} do not match partitions {names:?}"
        )));
    }
    for partition in table.iter() {
        tree.validate_partition(partition.name(), partition.region())?;
        let handed_out = partition.start() + partition.allocator().cursor();
        let files = tree.root(partition.name())?.files();
        if let Some((path, _)) = files
            .iter()
            .find(|(_, entry)| entry.size > 0 && entry.extent().end() > handed_out)
        {
            return Err(VolumeError::corrupt(format!(
                "file {}:{path} lies past the allocation cursor",
                partition.name()
            )));
        }
        for abandoned in partition.allocator().abandoned() {
            if let Some((path, _)) = files
                .iter()
                .find(|(_, entry)| entry.extent().overlaps(abandoned))
            {
                return Err(VolumeError::corrupt(format!(
                    "file {}:{path} overlaps abandoned range {}+{}",
                    partition.name(),
                    abandoned.offset,
                    abandoned.length
                )));
            }
        }
    }
    Ok(())
}

/// Durable snapshot of the partition table and namespace tree.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    slot: RecordSlot,
}

impl MetadataStore {
    /// Store writing to `slot`.
    pub fn new(slot: RecordSlot) -> Self {
        Self { slot }
    }

    /// Load the snapshot, or an empty volume if none was saved.
    pub fn load(&self, capacity: u64) -> VolumeResult<(PartitionTable, NamespaceTree)> {
        match self.slot.bytes()? {
            Some(bytes) => decode_metadata(&bytes, capacity),
            None => Ok((PartitionTable::new(), NamespaceTree::new())),
        }
    }

    /// Overwrite the snapshot.
    pub fn save(&mut self, table: &PartitionTable, tree: &NamespaceTree) -> VolumeResult<()> {
        let bytes = encode_metadata(table, tree)?;
        self.slot.store(bytes)
    }

    /// Underlying slot.
    pub fn slot(&self) -> &RecordSlot {
        &self.slot
    }

    /// Host path of the record, if file backed.
    pub fn path(&self) -> Option<&Path> {
        self.slot.path()
    }
}

#[derive(Serialize)]
struct CredentialsRef<'a> {
    version: u32,
    credentials: &'a BTreeMap<String, Credential>,
}

#[derive(Deserialize)]
struct CredentialsOwned {
    version: u32,
    #[serde(default)]
    credentials: BTreeMap<String, Credential>,
}

/// Durable partition to credential map, independent of the metadata record.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    slot: RecordSlot,
}

impl CredentialStore {
    /// Store writing to `slot`.
    pub fn new(slot: RecordSlot) -> Self {
        Self { slot }
    }

    /// Load the credential map, empty if none was saved.
    pub fn load(&self) -> VolumeResult<BTreeMap<String, Credential>> {
        match self.slot.bytes()? {
            Some(bytes) => {
                let record: CredentialsOwned = rmp_serde::from_slice(&bytes)?;
                check_version(record.version)?;
                Ok(record.credentials)
            }
            None => Ok(BTreeMap::new()),
        }
    }

    /// Overwrite the credential map.
    pub fn save(&mut self, credentials: &BTreeMap<String, Credential>) -> VolumeResult<()> {
        let record = CredentialsRef {
            version: RECORD_VERSION,
            credentials,
        };
        let bytes = rmp_serde::to_vec_named(&record)?;
        self.slot.store(bytes)
    }

    /// Underlying slot.
    pub fn slot(&self) -> &RecordSlot {
        &self.slot
    }
}
