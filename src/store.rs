// Copyright © 2026 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Fixed-size flat byte region simulating the volume's disk.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Fixed-size byte stores backing a volume.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{VolumeError, VolumeResult};

const ZERO_CHUNK: usize = 4096;

/// Flat byte region addressed by absolute offset. The length never changes
/// after creation.
pub trait BackingStore {
    /// Total size of the region in bytes.
    fn size(&self) -> u64;

    /// Fill `buf` with the bytes starting at `offset`.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> VolumeResult<()>;

    /// Write `data` starting at `offset`.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> VolumeResult<()>;

    /// Overwrite `len` bytes starting at `offset` with zeroes.
    fn zero(&mut self, offset: u64, len: u64) -> VolumeResult<()> {
        let chunk = [0u8; ZERO_CHUNK];
        let mut cursor = offset;
        let end = offset.saturating_add(len);
        while cursor < end {
            let step = (end - cursor).min(ZERO_CHUNK as u64) as usize;
            self.write_at(cursor, &chunk[..step])?;
            cursor += step as u64;
        }
        Ok(())
    }

    /// Push buffered writes to the medium.
    fn flush(&mut self) -> VolumeResult<()> {
        Ok(())
    }
}

fn check_range(size: u64, offset: u64, len: usize) -> VolumeResult<()> {
    let end = offset.checked_add(len as u64);
    match end {
        Some(end) if end <= size => Ok(()),
        _ => Err(VolumeError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("range {offset}+{len} outside backing store of {size} bytes"),
        ))),
    }
}

/// Backing store kept in a regular host file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    file: File,
    size: u64,
}

impl FileStore {
    /// Open the backing file at `path`, creating a zero-filled file of `size`
    /// bytes if it does not exist yet. An existing file must already have
    /// exactly `size` bytes.
    pub fn open_or_create(path: &Path, size: u64) -> VolumeResult<Self> {
        if path.exists() {
            let file = OpenOptions::new().read(true).write(true).open(path)?;
            let actual = file.metadata()?.len();
            if actual != size {
                return Err(VolumeError::Config(format!(
                    "backing file {} has {actual} bytes, configured volume size is {size}",
                    path.display()
                )));
            }
            debug!("opened backing file {} ({size} bytes)", path.display());
            return Ok(Self {
                path: path.to_path_buf(),
                file,
                size,
            });
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;
        file.set_len(size)?;
        info!("created backing file {} ({size} bytes)", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            file,
            size,
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BackingStore for FileStore {
    fn size(&self) -> u64 {
        self.size
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> VolumeResult<()> {
        check_range(self.size, offset, buf.len())?;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> VolumeResult<()> {
        check_range(self.size, offset, data.len())?;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> VolumeResult<()> {
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }
}

/// Backing store held entirely in memory. Used by tests and scratch volumes.
#[derive(Debug, Clone)]
pub struct MemStore {
    bytes: Vec<u8>,
}

impl MemStore {
    /// Zero-filled store of `size` bytes.
    pub fn new(size: u64) -> Self {
        Self {
            bytes: vec![0u8; size as usize],
        }
    }

    /// Raw view of the region.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl BackingStore for MemStore {
    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> VolumeResult<()> {
        check_range(self.size(), offset, buf.len())?;
        let start = offset as usize;
        buf.copy_from_slice(&self.bytes[start..start + buf.len()]);
        Ok(())
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> VolumeResult<()> {
        check_range(self.size(), offset, data.len())?;
        let start = offset as usize;
        self.bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }
}
