// Copyright © 2026 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Owned volume aggregate tying store, partitions, namespaces and credentials together.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! The volume aggregate and its persisted operations.

use log::{debug, info};

use crate::allocator::Extent;
use crate::config::VolumeConfig;
use crate::error::{ObjectKind, VolumeError, VolumeResult};
use crate::gate::AccessGate;
use crate::metadata::{CredentialStore, MetadataStore, RecordSlot};
use crate::namespace::{check_name, render_path, DirEntry, Directory, FileEntry, NamespaceTree};
use crate::partition::{Partition, PartitionTable};
use crate::session::Session;
use crate::store::{BackingStore, FileStore, MemStore};

/// The single in-process volume. Every operation takes it by reference and
/// persists metadata before returning success.
pub struct Volume {
    store: Box<dyn BackingStore>,
    table: PartitionTable,
    tree: NamespaceTree,
    gate: AccessGate,
    metadata: MetadataStore,
    credentials: CredentialStore,
}

impl std::fmt::Debug for Volume {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Volume")
            .field("capacity", &self.store.size())
            .field("partitions", &self.table.len())
            .finish()
    }
}

impl Volume {
    /// Open the file-backed volume described by `config`, creating the
    /// backing file on first use and reloading both records if present.
    pub fn open(config: &VolumeConfig) -> VolumeResult<Self> {
        let store = FileStore::open_or_create(&config.disk_path, config.volume_size)?;
        let volume = Self::from_parts(
            Box::new(store),
            MetadataStore::new(RecordSlot::file(&config.metadata_path)),
            CredentialStore::new(RecordSlot::file(&config.credentials_path)),
        )?;
        info!(
            "opened volume {} ({} bytes, {} partitions)",
            config.disk_path.display(),
            config.volume_size,
            volume.table.len()
        );
        Ok(volume)
    }

    /// Scratch volume kept entirely in memory.
    pub fn in_memory(size: u64) -> VolumeResult<Self> {
        Self::from_parts(
            Box::new(MemStore::new(size)),
            MetadataStore::new(RecordSlot::memory()),
            CredentialStore::new(RecordSlot::memory()),
        )
    }

    /// Assemble a volume from its parts, loading persisted state.
    pub fn from_parts(
        store: Box<dyn BackingStore>,
        metadata: MetadataStore,
        credentials: CredentialStore,
    ) -> VolumeResult<Self> {
        let (table, tree) = metadata.load(store.size())?;
        let gate = AccessGate::new(credentials.load()?);
        Ok(Self {
            store,
            table,
            tree,
            gate,
            metadata,
            credentials,
        })
    }

    /// Persist everything and release the backing store.
    pub fn close(mut self) -> VolumeResult<()> {
        self.persist_metadata()?;
        self.persist_credentials()?;
        self.store.flush()?;
        info!("closed volume ({} partitions)", self.table.len());
        Ok(())
    }

    /// Size of the backing store in bytes.
    pub fn capacity(&self) -> u64 {
        self.store.size()
    }

    /// Partition table.
    pub fn partitions(&self) -> &PartitionTable {
        &self.table
    }

    /// Namespace tree of every partition.
    pub fn namespace(&self) -> &NamespaceTree {
        &self.tree
    }

    /// Metadata record location.
    pub fn metadata_store(&self) -> &MetadataStore {
        &self.metadata
    }

    /// Credential record location.
    pub fn credential_store(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Look a partition up by name.
    pub fn partition(&self, name: &str) -> Option<&Partition> {
        self.table.lookup(name)
    }

    fn require_partition(&self, name: &str) -> VolumeResult<&Partition> {
        self.table
            .lookup(name)
            .ok_or_else(|| VolumeError::not_found(ObjectKind::Partition, name))
    }

    fn persist_metadata(&mut self) -> VolumeResult<()> {
        self.metadata.save(&self.table, &self.tree)
    }

    fn persist_credentials(&mut self) -> VolumeResult<()> {
        self.credentials.save(self.gate.credentials())
    }

    /// Create a partition of `size` bytes and give it an empty root.
    pub fn create_partition(&mut self, name: &str, size: u64) -> VolumeResult<Partition> {
        let capacity = self.store.size();
        let partition = self.table.create(name, size, capacity)?.clone();
        self.tree.insert_root(name);
        self.persist_metadata()?;
        Ok(partition)
    }

    /// Whether `partition` has an enrolled credential.
    pub fn is_enrolled(&self, partition: &str) -> bool {
        self.gate.is_enrolled(partition)
    }

    /// Enroll the credential of `partition` and persist the credential record.
    pub fn enroll(&mut self, partition: &str, username: &str, secret: &str) -> VolumeResult<()> {
        self.require_partition(partition)?;
        self.gate.enroll(partition, username, secret)?;
        self.persist_credentials()
    }

    /// Check a login against the credential of `partition`.
    pub fn login(&self, partition: &str, username: &str, secret: &str) -> VolumeResult<()> {
        self.require_partition(partition)?;
        self.gate.login(partition, username, secret)
    }

    /// Log in and open a session rooted at the partition's root directory.
    pub fn enter_partition(
        &mut self,
        partition: &str,
        username: &str,
        secret: &str,
    ) -> VolumeResult<Session<'_>> {
        self.login(partition, username, secret)?;
        info!("'{username}' entered partition '{partition}'");
        Ok(Session::new(self, partition))
    }

    /// Directory at `path` inside `partition`.
    pub fn resolve_directory(&self, partition: &str, path: &str) -> VolumeResult<&Directory> {
        self.tree.resolve(partition, path)
    }

    /// Child names of the directory at `path`.
    pub fn list(&self, partition: &str, path: &str) -> VolumeResult<Vec<String>> {
        Ok(self.resolve_directory(partition, path)?.names())
    }

    /// Detailed listing of the directory at `path`.
    pub fn listing(&self, partition: &str, path: &str) -> VolumeResult<Vec<DirEntry>> {
        Ok(self.resolve_directory(partition, path)?.listing())
    }

    /// Create directory `name` under `path`.
    pub fn make_directory(&mut self, partition: &str, path: &str, name: &str) -> VolumeResult<()> {
        self.tree.resolve_mut(partition, path)?.make_directory(name)?;
        debug!("mkdir {partition}:{}", child_path(path, name));
        self.persist_metadata()
    }

    /// Remove the empty directory `name` under `path`.
    pub fn remove_directory(
        &mut self,
        partition: &str,
        path: &str,
        name: &str,
    ) -> VolumeResult<()> {
        self.tree.resolve_mut(partition, path)?.remove_directory(name)?;
        debug!("rmdir {partition}:{}", child_path(path, name));
        self.persist_metadata()
    }

    /// Create the empty file `name` under `path` at the partition's cursor.
    pub fn create_file(
        &mut self,
        partition: &str,
        path: &str,
        name: &str,
    ) -> VolumeResult<FileEntry> {
        let part = self
            .table
            .lookup_mut(partition)
            .ok_or_else(|| VolumeError::not_found(ObjectKind::Partition, partition))?;
        let dir = self.tree.resolve_mut(partition, path)?;
        check_name(name)?;
        if dir.contains(name) {
            return Err(VolumeError::AlreadyExists(name.to_owned()));
        }
        let region = part.region();
        let offset = part.allocator_mut().allocate(region, 0)?;
        let entry = FileEntry { offset, size: 0 };
        dir.insert_file(name, entry)?;
        debug!("touch {partition}:{} at {offset}", child_path(path, name));
        self.persist_metadata()?;
        Ok(entry)
    }

    /// Remove file `name` under `path`. Its bytes are abandoned, not reused.
    pub fn remove_file(
        &mut self,
        partition: &str,
        path: &str,
        name: &str,
    ) -> VolumeResult<FileEntry> {
        let part = self
            .table
            .lookup_mut(partition)
            .ok_or_else(|| VolumeError::not_found(ObjectKind::Partition, partition))?;
        let entry = self.tree.resolve_mut(partition, path)?.remove_file(name)?;
        part.allocator_mut().abandon(entry.extent());
        debug!("rm {partition}:{}", child_path(path, name));
        self.persist_metadata()?;
        Ok(entry)
    }

    /// Replace the content of file `filename` under `path` with `bytes`.
    pub fn write_content(
        &mut self,
        partition: &str,
        path: &str,
        filename: &str,
        bytes: &[u8],
    ) -> VolumeResult<FileEntry> {
        let part = self
            .table
            .lookup_mut(partition)
            .ok_or_else(|| VolumeError::not_found(ObjectKind::Partition, partition))?;
        let entry = self.tree.resolve_mut(partition, path)?.file_mut(filename)?;
        let region = part.region();
        let new_size = bytes.len() as u64;
        let resize = part
            .allocator_mut()
            .resize(region, entry.extent(), new_size)?;
        entry.offset = resize.offset;
        entry.size = new_size;
        let updated = *entry;

        self.store.write_at(updated.offset, bytes)?;
        if let Some(Extent { offset, length }) = resize.released {
            self.store.zero(offset, length)?;
        }
        self.store.flush()?;
        debug!(
            "wrote {new_size} bytes to {partition}:{} at {}",
            child_path(path, filename),
            updated.offset
        );
        self.persist_metadata()?;
        Ok(updated)
    }

    /// Read the full content of file `filename` under `path`.
    pub fn read_content(
        &mut self,
        partition: &str,
        path: &str,
        filename: &str,
    ) -> VolumeResult<Vec<u8>> {
        let entry = *self.tree.resolve(partition, path)?.file(filename)?;
        let mut buf = vec![0u8; entry.size as usize];
        self.store.read_at(entry.offset, &mut buf)?;
        Ok(buf)
    }
}

fn child_path(path: &str, name: &str) -> String {
    let parent = render_path(path);
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}
