// Copyright © 2026 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Library root for the cohvol partitioned volume simulator.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Partitioned volume simulator.
//!
//! A fixed-size backing file is carved into named partitions. Each partition
//! owns a hierarchical namespace whose file contents live at byte extents
//! inside the partition, guarded by one enrolled credential. Partition table
//! and namespaces persist as a MessagePack record next to the backing file.

pub mod allocator;
pub mod config;
pub mod error;
pub mod gate;
pub mod metadata;
pub mod namespace;
pub mod partition;
pub mod session;
pub mod shell;
pub mod store;
pub mod volume;

pub use allocator::{Allocator, Extent};
pub use config::VolumeConfig;
pub use error::{ObjectKind, VolumeError, VolumeResult};
pub use gate::{AccessGate, Credential};
pub use metadata::{decode_metadata, encode_metadata, CredentialStore, MetadataStore, RecordSlot};
pub use namespace::{DirEntry, Directory, EntryKind, FileEntry, NamespaceTree, Node};
pub use partition::{Partition, PartitionTable};
pub use session::Session;
pub use shell::{CommandStatus, Shell};
pub use store::{BackingStore, FileStore, MemStore};
pub use volume::Volume;
