// Copyright © 2026 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Per-partition directory tree mapping names to file extents.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Per-partition directory trees.
//!
//! Directories hold named children in sorted order. Files carry only the
//! extent of their content; the bytes themselves live in the backing store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::allocator::Extent;
use crate::error::{ObjectKind, VolumeError, VolumeResult};

/// Location of a file's content in the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute offset of the first content byte.
    pub offset: u64,
    /// Content length in bytes.
    pub size: u64,
}

impl FileEntry {
    /// Range the content occupies.
    pub fn extent(&self) -> Extent {
        Extent::new(self.offset, self.size)
    }
}

/// Node in a partition namespace. Persisted with an explicit variant tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Directory holding further nodes.
    Directory(Directory),
    /// Leaf pointing at file content.
    File(FileEntry),
}

impl Node {
    /// Whether the node is a directory.
    pub fn is_directory(&self) -> bool {
        matches!(self, Node::Directory(_))
    }

    fn kind(&self) -> EntryKind {
        match self {
            Node::Directory(_) => EntryKind::Directory,
            Node::File(_) => EntryKind::File,
        }
    }
}

/// Kind of a directory child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Sub-directory.
    Directory,
    /// File entry.
    File,
}

/// One line of a detailed directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Child name.
    pub name: String,
    /// Child kind.
    pub kind: EntryKind,
    /// Content size for files, child count for directories.
    pub size: u64,
}

/// Directory node; children are owned and keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    #[serde(default)]
    children: BTreeMap<String, Node>,
}

impl Directory {
    /// Empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Child names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.children.keys().cloned().collect()
    }

    /// Name, kind and size of every child.
    pub fn listing(&self) -> Vec<DirEntry> {
        self.children
            .iter()
            .map(|(name, node)| DirEntry {
                name: name.clone(),
                kind: node.kind(),
                size: match node {
                    Node::Directory(dir) => dir.children.len() as u64,
                    Node::File(entry) => entry.size,
                },
            })
            .collect()
    }

    /// Whether the directory has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Look a child up by name.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    /// Child directory called `name`.
    pub fn directory(&self, name: &str) -> VolumeResult<&Directory> {
        match self.children.get(name) {
            Some(Node::Directory(dir)) => Ok(dir),
            Some(Node::File(_)) => Err(VolumeError::NotADirectory(name.to_owned())),
            None => Err(VolumeError::not_found(ObjectKind::Directory, name)),
        }
    }

    /// File entry called `name`.
    pub fn file(&self, name: &str) -> VolumeResult<&FileEntry> {
        match self.children.get(name) {
            Some(Node::File(entry)) => Ok(entry),
            Some(Node::Directory(_)) => Err(VolumeError::NotAFile(name.to_owned())),
            None => Err(VolumeError::not_found(ObjectKind::File, name)),
        }
    }

    pub(crate) fn file_mut(&mut self, name: &str) -> VolumeResult<&mut FileEntry> {
        match self.children.get_mut(name) {
            Some(Node::File(entry)) => Ok(entry),
            Some(Node::Directory(_)) => Err(VolumeError::NotAFile(name.to_owned())),
            None => Err(VolumeError::not_found(ObjectKind::File, name)),
        }
    }

    fn vacant(&self, name: &str) -> VolumeResult<()> {
        check_name(name)?;
        if self.children.contains_key(name) {
            return Err(VolumeError::AlreadyExists(name.to_owned()));
        }
        Ok(())
    }

    /// Add an empty sub-directory.
    pub fn make_directory(&mut self, name: &str) -> VolumeResult<()> {
        self.vacant(name)?;
        self.children
            .insert(name.to_owned(), Node::Directory(Directory::new()));
        Ok(())
    }

    /// Remove an empty sub-directory.
    pub fn remove_directory(&mut self, name: &str) -> VolumeResult<()> {
        if !self.directory(name)?.is_empty() {
            return Err(VolumeError::NotEmpty(name.to_owned()));
        }
        self.children.remove(name);
        Ok(())
    }

    /// Add a file entry; the caller has already reserved its extent.
    pub fn insert_file(&mut self, name: &str, entry: FileEntry) -> VolumeResult<()> {
        self.vacant(name)?;
        self.children.insert(name.to_owned(), Node::File(entry));
        Ok(())
    }

    /// Remove a file entry and hand it back so its extent can be retired.
    pub fn remove_file(&mut self, name: &str) -> VolumeResult<FileEntry> {
        let entry = *self.file(name)?;
        self.children.remove(name);
        Ok(entry)
    }

    /// Whether a child named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    fn collect_files(&self, prefix: &str, out: &mut Vec<(String, FileEntry)>) {
        for (name, node) in &self.children {
            let path = format!("{prefix}/{name}");
            match node {
                Node::Directory(dir) => dir.collect_files(&path, out),
                Node::File(entry) => out.push((path, *entry)),
            }
        }
    }

    /// Every file below this directory with its absolute path.
    pub fn files(&self) -> Vec<(String, FileEntry)> {
        let mut out = Vec::new();
        self.collect_files("", &mut out);
        out
    }

    fn check_names(&self) -> VolumeResult<()> {
        for (name, node) in &self.children {
            check_name(name)
                .map_err(|_| VolumeError::corrupt(format!("bad entry name '{name}'")))?;
            if let Node::Directory(dir) = node {
                dir.check_names()?;
            }
        }
        Ok(())
    }
}

/// Root directories of every partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceTree {
    roots: BTreeMap<String, Directory>,
}

impl NamespaceTree {
    /// Empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an empty root for a new partition.
    pub fn insert_root(&mut self, partition: &str) {
        self.roots.entry(partition.to_owned()).or_default();
    }

    /// Partitions that have a root.
    pub fn partitions(&self) -> impl Iterator<Item = &str> {
        self.roots.keys().map(String::as_str)
    }

    /// Root directory of `partition`.
    pub fn root(&self, partition: &str) -> VolumeResult<&Directory> {
        self.roots
            .get(partition)
            .ok_or_else(|| VolumeError::not_found(ObjectKind::Partition, partition))
    }

    /// Walk `path` from the root of `partition`.
    pub fn resolve(&self, partition: &str, path: &str) -> VolumeResult<&Directory> {
        let mut dir = self.root(partition)?;
        for component in split_path(path) {
            dir = match dir.get(component) {
                Some(Node::Directory(child)) => child,
                _ => return Err(VolumeError::PathNotFound(render_path(path))),
            };
        }
        Ok(dir)
    }

    pub(crate) fn resolve_mut(
        &mut self,
        partition: &str,
        path: &str,
    ) -> VolumeResult<&mut Directory> {
        let mut dir = self
            .roots
            .get_mut(partition)
            .ok_or_else(|| VolumeError::not_found(ObjectKind::Partition, partition))?;
        for component in split_path(path) {
            dir = match dir.children.get_mut(component) {
                Some(Node::Directory(child)) => child,
                _ => return Err(VolumeError::PathNotFound(render_path(path))),
            };
        }
        Ok(dir)
    }

    /// Check that every file of `partition` lies inside `region` and that no
    /// two non-empty files share bytes.
    pub fn validate_partition(&self, partition: &str, region: Extent) -> VolumeResult<()> {
        let root = self.root(partition)?;
        root.check_names()?;
        let mut files = root.files();
        if let Some((path, _)) = files.iter().find(|(_, f)| f.extent().checked_end().is_none()) {
            return Err(VolumeError::corrupt(format!(
                "file {partition}:{path} extent overflows"
            )));
        }
        if let Some((path, _)) = files.iter().find(|(_, f)| !region.contains(&f.extent())) {
            return Err(VolumeError::corrupt(format!(
                "file {partition}:{path} lies outside its partition"
            )));
        }
        files.retain(|(_, f)| f.size > 0);
        files.sort_by_key(|(_, f)| f.offset);
        for pair in files.windows(2) {
            if pair[0].1.extent().overlaps(&pair[1].1.extent()) {
                return Err(VolumeError::corrupt(format!(
                    "files {partition}:{} and {partition}:{} overlap",
                    pair[0].0, pair[1].0
                )));
            }
        }
        Ok(())
    }
}

/// Reject names that cannot be addressed by a path component.
pub(crate) fn check_name(name: &str) -> VolumeResult<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.chars().any(char::is_whitespace)
    {
        return Err(VolumeError::InvalidName(name.to_owned()));
    }
    Ok(())
}

/// Non-empty components of a slash-delimited path; `.` is skipped.
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/')
        .filter(|component| !component.is_empty() && *component != ".")
}

/// Canonical `/a/b` rendering of a path.
pub fn render_path(path: &str) -> String {
    let joined: Vec<&str> = split_path(path).collect();
    format!("/{}", joined.join("/"))
}
