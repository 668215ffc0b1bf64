// Copyright © 2026 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Validate that volumes survive close and reopen on disk.
// Author: Lukas Bower
#![forbid(unsafe_code)]

use std::fs;

use cohvol::{Volume, VolumeConfig, VolumeError};
use tempfile::TempDir;

fn config(dir: &TempDir) -> VolumeConfig {
    let _ = env_logger::builder().is_test(true).try_init();
    VolumeConfig::in_dir(dir.path(), 4096)
}

#[test]
fn fresh_volume_creates_zeroed_backing_file() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = config(&dir);
    let volume = Volume::open(&cfg).expect("open");
    assert_eq!(volume.capacity(), 4096);
    assert!(volume.partitions().is_empty());
    volume.close().expect("close");
    let bytes = fs::read(&cfg.disk_path).expect("disk");
    assert_eq!(bytes.len(), 4096);
    assert!(bytes.iter().all(|byte| *byte == 0));
    assert!(cfg.metadata_path.exists());
}

#[test]
fn namespace_content_and_credentials_survive_reopen() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = config(&dir);
    let (table, tree) = {
        let mut volume = Volume::open(&cfg).expect("open");
        volume.create_partition("p1", 1024).expect("p1");
        volume.create_partition("p2", 512).expect("p2");
        volume.enroll("p1", "alice", "pw").expect("enroll");
        let mut session = volume.enter_partition("p1", "alice", "pw").expect("enter");
        session.make_directory("docs").expect("mkdir");
        session.change_directory("docs").expect("cd");
        session.create_file("a.txt").expect("touch");
        session.edit_file("a.txt", b"hello").expect("edit");
        session.create_file("b.txt").expect("touch b");
        session.edit_file("b.txt", b"world!").expect("edit b");
        session.edit_file("a.txt", b"hello again").expect("relocate a");
        let volume = session.leave();
        // Dropped without close: every mutation already persisted.
        (volume.partitions().clone(), volume.namespace().clone())
    };

    let mut volume = Volume::open(&cfg).expect("reopen");
    assert_eq!(volume.partitions(), &table);
    assert_eq!(volume.namespace(), &tree);
    assert!(volume.is_enrolled("p1"));
    assert!(!volume.is_enrolled("p2"));
    assert!(matches!(
        volume.login("p1", "alice", "nope"),
        Err(VolumeError::InvalidCredential(_))
    ));
    assert_eq!(
        volume.read_content("p1", "/docs", "a.txt").expect("a"),
        b"hello again"
    );
    assert_eq!(volume.read_content("p1", "/docs", "b.txt").expect("b"), b"world!");

    volume.create_file("p1", "/docs", "c.txt").expect("touch c");
    let c = volume.write_content("p1", "/docs", "c.txt", b"c").expect("write c");
    assert_eq!(c.offset, table.lookup("p1").expect("p1").allocator().cursor());
    volume.close().expect("close");
}

#[test]
fn reopening_with_another_size_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = config(&dir);
    Volume::open(&cfg).expect("open").close().expect("close");
    let mut resized = cfg.clone();
    resized.volume_size = 8192;
    assert!(matches!(
        Volume::open(&resized),
        Err(VolumeError::Config(_))
    ));
}

#[test]
fn garbage_metadata_is_a_fatal_decode_error() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = config(&dir);
    Volume::open(&cfg).expect("open").close().expect("close");
    fs::write(&cfg.metadata_path, b"\xc1 not msgpack").expect("clobber");
    let err = Volume::open(&cfg).expect_err("garbage");
    assert!(err.is_fatal());
}

#[test]
fn metadata_lives_outside_the_backing_file() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = config(&dir);
    let mut volume = Volume::open(&cfg).expect("open");
    volume.create_partition("p1", 128).expect("p1");
    volume.create_file("p1", "/", "f").expect("touch");
    volume.write_content("p1", "/", "f", b"payload").expect("write");
    volume.close().expect("close");

    let disk = fs::read(&cfg.disk_path).expect("disk");
    assert_eq!(disk.len(), 4096);
    assert_eq!(&disk[..7], b"payload");
    assert!(disk[7..].iter().all(|byte| *byte == 0));
}
