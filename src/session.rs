// Copyright © 2026 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Logged-in partition session tracking a working directory.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Working-directory sessions inside one partition.

use log::debug;

use crate::error::VolumeResult;
use crate::namespace::{split_path, DirEntry, FileEntry};
use crate::volume::Volume;

/// Access to one partition after the credential check passed. Commands are
/// relative to the working directory.
#[derive(Debug)]
pub struct Session<'v> {
    volume: &'v mut Volume,
    partition: String,
    cwd: Vec<String>,
}

impl<'v> Session<'v> {
    pub(crate) fn new(volume: &'v mut Volume, partition: &str) -> Self {
        Self {
            volume,
            partition: partition.to_owned(),
            cwd: Vec::new(),
        }
    }

    /// Partition this session is bound to.
    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// Working directory rendered as `/a/b`.
    pub fn current_path(&self) -> String {
        format!("/{}", self.cwd.join("/"))
    }

    /// Child names of the working directory.
    pub fn list(&self) -> VolumeResult<Vec<String>> {
        self.volume.list(&self.partition, &self.current_path())
    }

    /// Detailed listing of the working directory.
    pub fn listing(&self) -> VolumeResult<Vec<DirEntry>> {
        self.volume.listing(&self.partition, &self.current_path())
    }

    /// Change the working directory. Accepts `..`, `/`, child names and
    /// slash-separated relative or absolute paths. `..` at the root stays at
    /// the root.
    pub fn change_directory(&mut self, target: &str) -> VolumeResult<()> {
        let mut next = if target.starts_with('/') {
            Vec::new()
        } else {
            self.cwd.clone()
        };
        for component in split_path(target) {
            if component == ".." {
                next.pop();
            } else {
                next.push(component.to_owned());
            }
        }
        let rendered = format!("/{}", next.join("/"));
        self.volume.resolve_directory(&self.partition, &rendered)?;
        debug!("cd {}:{rendered}", self.partition);
        self.cwd = next;
        Ok(())
    }

    /// Create a directory in the working directory.
    pub fn make_directory(&mut self, name: &str) -> VolumeResult<()> {
        let cwd = self.current_path();
        self.volume.make_directory(&self.partition, &cwd, name)
    }

    /// Remove an empty directory from the working directory.
    pub fn remove_directory(&mut self, name: &str) -> VolumeResult<()> {
        let cwd = self.current_path();
        self.volume.remove_directory(&self.partition, &cwd, name)
    }

    /// Create an empty file in the working directory.
    pub fn create_file(&mut self, name: &str) -> VolumeResult<FileEntry> {
        let cwd = self.current_path();
        self.volume.create_file(&self.partition, &cwd, name)
    }

    /// Remove a file from the working directory.
    pub fn remove_file(&mut self, name: &str) -> VolumeResult<FileEntry> {
        let cwd = self.current_path();
        self.volume.remove_file(&self.partition, &cwd, name)
    }

    /// Replace the content of a file in the working directory.
    pub fn edit_file(&mut self, name: &str, content: &[u8]) -> VolumeResult<FileEntry> {
        let cwd = self.current_path();
        self.volume.write_content(&self.partition, &cwd, name, content)
    }

    /// Read the content of a file in the working directory.
    pub fn read_file(&mut self, name: &str) -> VolumeResult<Vec<u8>> {
        let cwd = self.current_path();
        self.volume.read_content(&self.partition, &cwd, name)
    }

    /// End the session and hand the volume back.
    pub fn leave(self) -> &'v mut Volume {
        debug!("left partition {}", self.partition);
        self.volume
    }
}

#[cfg(test)]
mod tests {
    use crate::error::VolumeError;
    use crate::volume::Volume;

    fn volume() -> Volume {
        let mut volume = Volume::in_memory(1024).expect("volume");
        volume.create_partition("p1", 512).expect("p1");
        volume.enroll("p1", "alice", "pw").expect("enroll");
        volume
    }

    #[test]
    fn cd_walks_down_up_and_to_root() {
        let mut volume = volume();
        let mut session = volume.enter_partition("p1", "alice", "pw").expect("enter");
        session.make_directory("docs").expect("mkdir");
        session.change_directory("docs").expect("cd docs");
        session.make_directory("drafts").expect("mkdir drafts");
        session.change_directory("drafts").expect("cd drafts");
        assert_eq!(session.current_path(), "/docs/drafts");
        session.change_directory("..").expect("cd ..");
        assert_eq!(session.current_path(), "/docs");
        session.change_directory("/").expect("cd /");
        session.change_directory("..").expect("cd .. at root");
        assert_eq!(session.current_path(), "/");
        session.change_directory("docs/drafts").expect("cd nested");
        assert_eq!(session.current_path(), "/docs/drafts");
    }

    #[test]
    fn cd_into_missing_or_file_keeps_cwd() {
        let mut volume = volume();
        let mut session = volume.enter_partition("p1", "alice", "pw").expect("enter");
        session.create_file("notes").expect("touch");
        assert!(matches!(
            session.change_directory("notes"),
            Err(VolumeError::PathNotFound(_))
        ));
        assert!(matches!(
            session.change_directory("ghost"),
            Err(VolumeError::PathNotFound(_))
        ));
        assert_eq!(session.current_path(), "/");
    }

    #[test]
    fn session_commands_act_on_the_working_directory() {
        let mut volume = volume();
        let mut session = volume.enter_partition("p1", "alice", "pw").expect("enter");
        session.make_directory("docs").expect("mkdir");
        session.change_directory("docs").expect("cd");
        session.create_file("a.txt").expect("touch");
        session.edit_file("a.txt", b"hello").expect("edit");
        assert_eq!(session.read_file("a.txt").expect("cat"), b"hello");
        assert_eq!(session.list().expect("ls"), vec!["a.txt"]);
        session.change_directory("..").expect("cd ..");
        assert!(matches!(
            session.remove_directory("docs"),
            Err(VolumeError::NotEmpty(_))
        ));
        let volume = session.leave();
        assert_eq!(volume.list("p1", "docs").expect("ls"), vec!["a.txt"]);
    }
}
