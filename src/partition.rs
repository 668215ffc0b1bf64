// Copyright © 2026 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Partition table carving the backing store into disjoint regions.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Partition table: named, disjoint byte ranges of the backing store.

use std::collections::BTreeMap;

use log::info;
use serde::{Deserialize, Serialize};

use crate::allocator::{Allocator, Extent};
use crate::error::{VolumeError, VolumeResult};
use crate::namespace::check_name;

/// Named region of the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    name: String,
    start: u64,
    length: u64,
    #[serde(default)]
    allocator: Allocator,
}

impl Partition {
    fn new(name: &str, start: u64, length: u64) -> Self {
        Self {
            name: name.to_owned(),
            start,
            length,
            allocator: Allocator::new(),
        }
    }

    /// Partition name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute offset of the first byte.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Size in bytes.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// One past the last byte.
    pub fn end(&self) -> u64 {
        self.start + self.length
    }

    /// The partition's range as an extent.
    pub fn region(&self) -> Extent {
        Extent::new(self.start, self.length)
    }

    /// Allocation state of the partition.
    pub fn allocator(&self) -> &Allocator {
        &self.allocator
    }

    pub(crate) fn allocator_mut(&mut self) -> &mut Allocator {
        &mut self.allocator
    }

    /// Bytes not yet handed out to files.
    pub fn available(&self) -> u64 {
        self.allocator.available(self.region())
    }
}

/// Partition name to region mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionTable {
    partitions: BTreeMap<String, Partition>,
}

impl PartitionTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all partition lengths.
    pub fn used_space(&self) -> u64 {
        self.partitions.values().map(Partition::length).sum()
    }

    /// Bytes of a volume of `capacity` bytes not covered by any partition.
    pub fn free_space(&self, capacity: u64) -> u64 {
        capacity.saturating_sub(self.used_space())
    }

    fn next_start(&self) -> u64 {
        self.partitions
            .values()
            .map(Partition::end)
            .max()
            .unwrap_or(0)
    }

    /// Carve a new partition of `size` bytes out of a volume of `capacity`
    /// bytes. Partitions are packed back to back in creation order.
    pub fn create(&mut self, name: &str, size: u64, capacity: u64) -> VolumeResult<&Partition> {
        check_name(name)?;
        if self.partitions.contains_key(name) {
            return Err(VolumeError::AlreadyExists(name.to_owned()));
        }
        let available = self.free_space(capacity);
        if size > available {
            return Err(VolumeError::insufficient(size, available));
        }
        let start = self.next_start();
        if start.checked_add(size).map_or(true, |end| end > capacity) {
            return Err(VolumeError::insufficient(size, capacity.saturating_sub(start)));
        }
        info!("partition '{name}' created at {start} with {size} bytes");
        let partition: &Partition = self
            .partitions
            .entry(name.to_owned())
            .or_insert_with(|| Partition::new(name, start, size));
        Ok(partition)
    }

    /// Look a partition up by name.
    pub fn lookup(&self, name: &str) -> Option<&Partition> {
        self.partitions.get(name)
    }

    pub(crate) fn lookup_mut(&mut self, name: &str) -> Option<&mut Partition> {
        self.partitions.get_mut(name)
    }

    /// All partitions in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.values()
    }

    /// Number of partitions.
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    /// Whether no partition exists yet.
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Check loaded state: keys match names, regions are disjoint and fit in
    /// `capacity`, allocator state stays inside each region.
    pub fn validate(&self, capacity: u64) -> VolumeResult<()> {
        let mut regions: Vec<&Partition> = Vec::with_capacity(self.partitions.len());
        for (key, partition) in &self.partitions {
            if key != &partition.name {
                return Err(VolumeError::corrupt(format!(
                    "partition key '{key}' names '{}'",
                    partition.name
                )));
            }
            if partition.start.checked_add(partition.length).map_or(true, |end| end > capacity) {
                return Err(VolumeError::corrupt(format!(
                    "partition '{key}' exceeds volume size {capacity}"
                )));
            }
            if let Some(clash) = regions
                .iter()
                .find(|other| other.region().overlaps(&partition.region()))
            {
                return Err(VolumeError::corrupt(format!(
                    "partitions '{}' and '{key}' overlap",
                    clash.name
                )));
            }
            partition.allocator.validate(partition.region())?;
            regions.push(partition);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_pack_contiguously() {
        let mut table = PartitionTable::new();
        assert_eq!(table.create("p1", 512, 1024).expect("p1").start(), 0);
        assert_eq!(table.create("p2", 100, 1024).expect("p2").start(), 512);
        assert_eq!(table.create("p0", 12, 1024).expect("p0").start(), 612);
        assert_eq!(table.used_space(), 624);
        assert_eq!(table.free_space(1024), 400);
        assert!(table.validate(1024).is_ok());
    }

    #[test]
    fn oversized_partition_reports_remaining_space() {
        let mut table = PartitionTable::new();
        table.create("p1", 100, 1024).expect("p1");
        let err = table.create("p2", 1000, 1024).expect_err("too big");
        assert!(matches!(
            err,
            VolumeError::InsufficientSpace {
                requested: 1000,
                available: 924
            }
        ));
        assert!(table.lookup("p2").is_none());
    }

    #[test]
    fn duplicate_and_malformed_names_are_rejected() {
        let mut table = PartitionTable::new();
        table.create("p1", 10, 1024).expect("p1");
        assert!(matches!(
            table.create("p1", 10, 1024),
            Err(VolumeError::AlreadyExists(_))
        ));
        assert!(matches!(
            table.create("", 10, 1024),
            Err(VolumeError::InvalidName(_))
        ));
        assert!(matches!(
            table.create("a/b", 10, 1024),
            Err(VolumeError::InvalidName(_))
        ));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn zero_sized_partition_is_accepted() {
        let mut table = PartitionTable::new();
        let p = table.create("empty", 0, 16).expect("empty");
        assert_eq!(p.available(), 0);
        table.create("full", 16, 16).expect("full");
        assert_eq!(table.free_space(16), 0);
    }

    #[test]
    fn validate_rejects_overlap_after_tampering() {
        let mut table = PartitionTable::new();
        table.create("p1", 10, 100).expect("p1");
        table.create("p2", 10, 100).expect("p2");
        table.lookup_mut("p2").expect("p2").start = 5;
        assert!(matches!(table.validate(100), Err(VolumeError::Corrupt(_))));
    }
}
