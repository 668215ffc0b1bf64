// Copyright © 2026 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Validate partition, namespace and content semantics end to end.
// Author: Lukas Bower
#![forbid(unsafe_code)]

use cohvol::{EntryKind, Extent, ObjectKind, Volume, VolumeError};

fn enrolled(size: u64, partitions: &[(&str, u64)]) -> Volume {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut volume = Volume::in_memory(size).expect("volume");
    for (name, length) in partitions {
        volume.create_partition(name, *length).expect("create partition");
        volume.enroll(name, "alice", "pw").expect("enroll");
    }
    volume
}

#[test]
fn documented_walkthrough() {
    let mut volume = enrolled(1024, &[("p1", 512)]);
    let p1 = volume.partition("p1").expect("p1");
    assert_eq!((p1.start(), p1.length()), (0, 512));

    let mut session = volume.enter_partition("p1", "alice", "pw").expect("enter");
    session.make_directory("docs").expect("mkdir docs");
    session.change_directory("docs").expect("cd docs");
    session.create_file("a.txt").expect("touch");
    let entry = session.edit_file("a.txt", b"hello").expect("edit");
    assert_eq!(entry.size, 5);
    assert_eq!(session.read_file("a.txt").expect("cat"), b"hello");
    session.change_directory("..").expect("cd ..");
    assert!(matches!(
        session.remove_directory("docs"),
        Err(VolumeError::NotEmpty(_))
    ));
    session.change_directory("docs").expect("cd docs");
    session.remove_file("a.txt").expect("rm");
    session.change_directory("/").expect("cd /");
    session.remove_directory("docs").expect("rmdir");
    assert!(session.list().expect("ls").is_empty());
}

#[test]
fn partition_requests_beyond_free_space_report_availability() {
    let mut volume = enrolled(1024, &[]);
    volume.create_partition("p1", 100).expect("p1");
    let err = volume.create_partition("p2", 1000).expect_err("too large");
    assert!(matches!(
        err,
        VolumeError::InsufficientSpace {
            requested: 1000,
            available: 924
        }
    ));
    assert!(volume.partition("p2").is_none());
    let p2 = volume.create_partition("p2", 924).expect("exact fit");
    assert_eq!(p2.start(), 100);
    assert_eq!(volume.partitions().free_space(volume.capacity()), 0);
    assert!(matches!(
        volume.create_partition("p1", 0),
        Err(VolumeError::AlreadyExists(_))
    ));
}

#[test]
fn partitions_never_overlap_and_fit_the_volume() {
    let mut volume = enrolled(4096, &[]);
    for (index, size) in [300u64, 1, 0, 1024, 17].into_iter().enumerate() {
        volume
            .create_partition(&format!("p{index}"), size)
            .expect("create");
    }
    let parts: Vec<_> = volume.partitions().iter().cloned().collect();
    for (i, a) in parts.iter().enumerate() {
        assert!(a.end() <= volume.capacity());
        for b in &parts[i + 1..] {
            assert!(!a.region().overlaps(&b.region()), "{} overlaps {}", a.name(), b.name());
        }
    }
}

#[test]
fn file_extents_stay_inside_their_partition_and_disjoint() {
    let mut volume = enrolled(2048, &[("p1", 256), ("p2", 256)]);
    for partition in ["p1", "p2"] {
        volume.make_directory(partition, "/", "a").expect("mkdir a");
        volume.make_directory(partition, "/a", "b").expect("mkdir a/b");
        for (dir, name, body) in [("/", "x", "xx"), ("/a", "y", "yyyy"), ("/a/b", "z", "z")] {
            volume.create_file(partition, dir, name).expect("touch");
            volume
                .write_content(partition, dir, name, body.as_bytes())
                .expect("write");
        }
        volume
            .write_content(partition, "/", "x", b"x grown past its neighbours")
            .expect("grow");
    }
    for partition in volume.partitions().iter() {
        let files = volume
            .namespace()
            .root(partition.name())
            .expect("root")
            .files();
        assert_eq!(files.len(), 3);
        for (i, (path, entry)) in files.iter().enumerate() {
            assert!(partition.region().contains(&entry.extent()), "{path}");
            for (other, next) in &files[i + 1..] {
                assert!(!entry.extent().overlaps(&next.extent()), "{path} vs {other}");
            }
        }
    }
    assert_eq!(
        volume.read_content("p2", "/", "x").expect("x"),
        b"x grown past its neighbours"
    );
    assert_eq!(volume.read_content("p2", "/a/b", "z").expect("z"), b"z");
}

#[test]
fn cursor_only_moves_forward() {
    let mut volume = enrolled(1024, &[("p1", 512)]);
    let mut last = 0;
    let mut observe = |volume: &Volume| {
        let cursor = volume.partition("p1").expect("p1").allocator().cursor();
        assert!(cursor >= last);
        last = cursor;
    };
    volume.create_file("p1", "/", "a").expect("touch a");
    observe(&volume);
    volume.write_content("p1", "/", "a", &[7u8; 64]).expect("write a");
    observe(&volume);
    volume.create_file("p1", "/", "b").expect("touch b");
    volume.write_content("p1", "/", "b", &[8u8; 16]).expect("write b");
    observe(&volume);
    volume.write_content("p1", "/", "a", &[9u8; 8]).expect("shrink a");
    observe(&volume);
    volume.remove_file("p1", "/", "b").expect("rm b");
    observe(&volume);
    volume.write_content("p1", "/", "a", &[1u8; 100]).expect("grow a");
    observe(&volume);
    let allocator = volume.partition("p1").expect("p1").allocator();
    assert_eq!(allocator.cursor(), 180);
    assert!(allocator.abandoned().contains(&Extent::new(0, 8)));
}

#[test]
fn growing_the_last_file_uses_its_own_bytes() {
    let mut volume = enrolled(1024, &[("p1", 64)]);
    volume.create_file("p1", "/", "f").expect("touch");
    volume.write_content("p1", "/", "f", &[1u8; 40]).expect("write");
    let entry = volume.write_content("p1", "/", "f", &[2u8; 64]).expect("fill");
    assert_eq!(entry.offset, 0);
    assert_eq!(volume.partition("p1").expect("p1").available(), 0);
}

#[test]
fn lookups_distinguish_files_from_directories() {
    let mut volume = enrolled(1024, &[("p1", 512)]);
    volume.make_directory("p1", "/", "docs").expect("mkdir");
    volume.create_file("p1", "/", "notes").expect("touch");
    assert!(matches!(
        volume.read_content("p1", "/", "docs"),
        Err(VolumeError::NotAFile(_))
    ));
    assert!(matches!(
        volume.remove_directory("p1", "/", "notes"),
        Err(VolumeError::NotADirectory(_))
    ));
    assert!(matches!(
        volume.list("p1", "/notes"),
        Err(VolumeError::PathNotFound(_))
    ));
    assert!(matches!(
        volume.remove_file("p1", "/", "ghost"),
        Err(VolumeError::NotFound {
            kind: ObjectKind::File,
            ..
        })
    ));
    let listing = volume.listing("p1", "/").expect("listing");
    let kinds: Vec<_> = listing.iter().map(|entry| entry.kind).collect();
    assert_eq!(kinds, vec![EntryKind::Directory, EntryKind::File]);
}

#[test]
fn full_partition_still_accepts_empty_files() {
    let mut volume = enrolled(64, &[("p1", 8)]);
    volume.create_file("p1", "/", "big").expect("touch");
    volume.write_content("p1", "/", "big", &[1u8; 8]).expect("fill");
    volume.create_file("p1", "/", "empty").expect("touch when full");
    assert!(matches!(
        volume.write_content("p1", "/", "empty", b"x"),
        Err(VolumeError::InsufficientSpace {
            requested: 1,
            available: 0
        })
    ));
    assert!(volume.read_content("p1", "/", "empty").expect("read").is_empty());
}
