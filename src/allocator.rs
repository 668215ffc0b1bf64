// Copyright © 2026 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Partition-wide bump allocator handing out file byte ranges.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Bump allocation inside one partition.
//!
//! Every partition keeps a single cursor shared by all of its directories, so
//! files in sibling directories can never be handed overlapping ranges. Ranges
//! given up by removed, shrunk or relocated files are recorded as abandoned
//! and are never handed out again.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{VolumeError, VolumeResult};

/// Byte range inside the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    /// Absolute offset of the first byte.
    pub offset: u64,
    /// Number of bytes.
    pub length: u64,
}

impl Extent {
    /// Construct an extent.
    pub const fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// One past the last byte.
    pub const fn end(&self) -> u64 {
        self.offset + self.length
    }

    /// One past the last byte, `None` if that does not fit in a `u64`.
    pub const fn checked_end(&self) -> Option<u64> {
        self.offset.checked_add(self.length)
    }

    /// Whether the extent covers no bytes.
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether both extents share at least one byte.
    pub fn overlaps(&self, other: &Extent) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.offset < other.end()
            && other.offset < self.end()
    }

    /// Whether `inner` lies entirely inside this extent.
    pub fn contains(&self, inner: &Extent) -> bool {
        match (self.checked_end(), inner.checked_end()) {
            (Some(end), Some(inner_end)) => inner.offset >= self.offset && inner_end <= end,
            _ => false,
        }
    }
}

/// Outcome of [`Allocator::resize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resize {
    /// Offset the file content now starts at.
    pub offset: u64,
    /// Range given up by the resize, if any. Callers scrub it.
    pub released: Option<Extent>,
}

/// Allocation state of one partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocator {
    cursor: u64,
    #[serde(default)]
    abandoned: Vec<Extent>,
}

impl Allocator {
    /// Fresh allocator with nothing handed out.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes handed out so far, relative to the partition start.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Ranges that were released and will never be reused.
    pub fn abandoned(&self) -> &[Extent] {
        &self.abandoned
    }

    /// Total size of the abandoned ranges.
    pub fn abandoned_bytes(&self) -> u64 {
        self.abandoned.iter().map(|extent| extent.length).sum()
    }

    /// Bytes still available in `region`.
    pub fn available(&self, region: Extent) -> u64 {
        region.length.saturating_sub(self.cursor)
    }

    /// Hand out `requested` bytes at the cursor and return their offset.
    pub fn allocate(&mut self, region: Extent, requested: u64) -> VolumeResult<u64> {
        let available = self.available(region);
        if requested > available {
            return Err(VolumeError::insufficient(requested, available));
        }
        let offset = region.offset + self.cursor;
        self.cursor += requested;
        debug!("allocated {requested} bytes at {offset} (cursor {})", self.cursor);
        Ok(offset)
    }

    /// Move `current` to a range of `new_size` bytes.
    ///
    /// Shrinking stays in place. Growing stays in place when the file ends at
    /// the cursor; the file's own bytes count as available in that case.
    /// Otherwise the content moves to a fresh range at the cursor.
    pub fn resize(
        &mut self,
        region: Extent,
        current: Extent,
        new_size: u64,
    ) -> VolumeResult<Resize> {
        if new_size <= current.length {
            let tail = Extent::new(current.offset + new_size, current.length - new_size);
            self.abandon(tail);
            return Ok(Resize {
                offset: current.offset,
                released: (!tail.is_empty()).then_some(tail),
            });
        }

        let available = self.available(region);
        if current.end() == region.offset + self.cursor {
            let extra = new_size - current.length;
            if extra > available {
                return Err(VolumeError::insufficient(
                    new_size,
                    available + current.length,
                ));
            }
            self.cursor += extra;
            debug!(
                "grew extent at {} to {new_size} bytes in place",
                current.offset
            );
            return Ok(Resize {
                offset: current.offset,
                released: None,
            });
        }

        let offset = self.allocate(region, new_size)?;
        self.abandon(current);
        Ok(Resize {
            offset,
            released: (!current.is_empty()).then_some(current),
        })
    }

    /// Record `extent` as permanently unused.
    pub fn abandon(&mut self, extent: Extent) {
        if extent.is_empty() {
            return;
        }
        warn!("abandoning {} bytes at {}", extent.length, extent.offset);
        self.abandoned.push(extent);
    }

    /// Check persisted state against the partition `region`.
    pub fn validate(&self, region: Extent) -> VolumeResult<()> {
        if self.cursor > region.length {
            return Err(VolumeError::corrupt(format!(
                "allocation cursor {} exceeds partition length {}",
                self.cursor, region.length
            )));
        }
        if let Some(stray) = self.abandoned.iter().find(|e| e.checked_end().is_none()) {
            return Err(VolumeError::corrupt(format!(
                "abandoned range {}+{} overflows",
                stray.offset, stray.length
            )));
        }
        if let Some(stray) = self.abandoned.iter().find(|e| !region.contains(e)) {
            return Err(VolumeError::corrupt(format!(
                "abandoned range {}+{} outside partition",
                stray.offset, stray.length
            )));
        }
        Ok(())
    }
}
