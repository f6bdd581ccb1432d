//! End-to-end tests: write an image, read it back

mod common;

use isofs::{
    FsEntry, IsoError, IsoFilesystem, IsoWriter, LookupStrategy, MemoryMedium, NodeMetadata,
    ReadPolicy, SliceSource, WriterOptions,
};

fn options(volume_id: &str) -> WriterOptions {
    WriterOptions {
        volume_identifier: volume_id.to_string(),
        timestamp: Some(common::test_timestamp()),
        ..WriterOptions::default()
    }
}

fn medium() -> MemoryMedium {
    MemoryMedium::new(2048).unwrap()
}

/// Scenario: minimal Primary-only image without SUSP.
#[test]
fn minimal_primary_image() {
    let mut medium = medium();
    let mut writer = IsoWriter::new(WriterOptions {
        include_supplementary: false,
        enable_susp: false,
        ..options("MINIMAL")
    });
    writer.add_directory("/A", None).unwrap();
    writer.add_file("/A/HELLO.TXT", 5, None).unwrap();
    writer
        .write_and_close(&mut medium, |path| {
            assert_eq!(path, "/A/HELLO.TXT");
            Ok(SliceSource::new(b"hello"))
        })
        .unwrap();

    let mut fs = IsoFilesystem::open(
        medium,
        ReadPolicy::Primary(LookupStrategy::DirectoryRecords),
    )
    .unwrap();
    assert_eq!(fs.volume_identifier(), "MINIMAL");

    let dir = fs.entry("/A").unwrap();
    assert!(dir.is_directory());

    let names: Vec<String> = fs
        .list("/A")
        .unwrap()
        .iter()
        .map(|e| e.name().to_string())
        .collect();
    assert_eq!(names, ["HELLO.TXT;1"]);

    let file = fs.entry("/A/HELLO.TXT").unwrap();
    let content = fs.read_file(&file).unwrap().read_to_end().unwrap();
    assert_eq!(content, b"hello");
}

/// Scenario: Joliet + Rock Ridge; `Any` prefers the Primary descriptor
/// because it carries SUSP.
#[test]
fn joliet_and_rock_ridge() {
    let mut medium = medium();
    let mut writer = IsoWriter::new(options("GRUB"));
    writer
        .add_file(
            "/boot/grub.cfg",
            18,
            Some(NodeMetadata {
                uid: Some(1000),
                gid: Some(1000),
                mode: Some(0o644),
                ..NodeMetadata::default()
            }),
        )
        .unwrap();
    writer
        .write_and_close(&mut medium, |_| Ok(SliceSource::new(b"set default=0\nboot\n")))
        .unwrap();

    let mut fs = IsoFilesystem::open(
        medium.clone(),
        ReadPolicy::Any(LookupStrategy::DirectoryRecords),
    )
    .unwrap();
    assert!(fs.has_rock_ridge().unwrap());
    // Any selected the Primary (ASCII) descriptor.
    assert_eq!(fs.volume_identifier(), "GRUB");

    let entry = fs.entry("/boot/grub.cfg").unwrap();
    let FsEntry::File { name, metadata, .. } = &entry else {
        panic!("expected file, got {entry:?}");
    };
    assert_eq!(name, "grub.cfg");
    assert_eq!(metadata.mode, Some(0o644));
    assert_eq!(metadata.uid, Some(1000));
    assert_eq!(metadata.gid, Some(1000));

    // The Supplementary view records the name directly in UCS-2.
    let mut fs = IsoFilesystem::open(
        medium,
        ReadPolicy::Supplementary(LookupStrategy::DirectoryRecords),
    )
    .unwrap();
    let entry = fs.entry("/boot/grub.cfg").unwrap();
    assert_eq!(entry.name(), "grub.cfg");
    let content = fs.read_file(&entry).unwrap().read_to_end().unwrap();
    assert_eq!(content, b"set default=0\nboot\n");
}

/// Scenario: sibling names that collide after legacy encoding are
/// uniquified with digit substitution.
#[test]
fn legacy_name_uniquification() {
    let mut medium = medium();
    let mut writer = IsoWriter::new(WriterOptions {
        include_supplementary: false,
        enable_susp: false,
        ..options("COLLIDE")
    });
    writer.add_file("/ABCDEFGH.TXT", 1, None).unwrap();
    writer.add_file("/abcdefgh.txt", 1, None).unwrap();
    writer.add_file("/Abcdefgh.txt", 1, None).unwrap();
    writer
        .write_and_close(&mut medium, |_| Ok(SliceSource::new(b"x")))
        .unwrap();

    let mut fs = IsoFilesystem::open(
        medium,
        ReadPolicy::Primary(LookupStrategy::DirectoryRecords),
    )
    .unwrap();
    let mut names: Vec<String> = fs
        .list("/")
        .unwrap()
        .iter()
        .map(|e| e.name().to_string())
        .collect();
    names.sort();
    assert_eq!(
        names,
        ["ABCDEFG0.TXT;1", "ABCDEFG1.TXT;1", "ABCDEFGH.TXT;1"]
    );
}

/// Scenario: symlink target round trip through Rock Ridge.
#[test]
fn symlink_round_trip() {
    let mut medium = medium();
    let mut writer = IsoWriter::new(options("LINKS"));
    writer.add_symlink("/link", "/a/../b", None).unwrap();
    writer
        .write_and_close(&mut medium, |_| Ok(SliceSource::new(b"")))
        .unwrap();

    let mut fs = IsoFilesystem::open(
        medium.clone(),
        ReadPolicy::Primary(LookupStrategy::DirectoryRecords),
    )
    .unwrap();
    let entry = fs.entry("/link").unwrap();
    let FsEntry::Symlink { name, target, .. } = &entry else {
        panic!("expected symlink, got {entry:?}");
    };
    assert_eq!(name, "link");
    assert_eq!(target, "/a/../b");

    // The Joliet view cannot represent symlinks; the entry is absent.
    let mut fs = IsoFilesystem::open(
        medium,
        ReadPolicy::Supplementary(LookupStrategy::DirectoryRecords),
    )
    .unwrap();
    assert_eq!(fs.entry("/link"), Err(IsoError::InvalidPath));
}

/// Scenario: written path tables resolve the same tree.
#[test]
fn path_table_resolution_on_written_image() {
    let mut medium = medium();
    let mut writer = IsoWriter::new(WriterOptions {
        include_supplementary: false,
        enable_susp: false,
        create_optional_path_tables: true,
        ..options("TABLES")
    });
    writer.add_directory("/A/B", None).unwrap();
    writer.add_file("/A/B/C.TXT", 4, None).unwrap();
    writer
        .write_and_close(&mut medium, |_| Ok(SliceSource::new(b"data")))
        .unwrap();

    let mut fs =
        IsoFilesystem::open(medium, ReadPolicy::Primary(LookupStrategy::PathTable)).unwrap();
    let dir = fs.entry("/A/B").unwrap();
    assert!(dir.is_directory());
    let file = fs.entry("/A/B/C.TXT").unwrap();
    let content = fs.read_file(&file).unwrap().read_to_end().unwrap();
    assert_eq!(content, b"data");
}

#[test]
fn zero_length_files_and_deep_trees() {
    let mut medium = medium();
    let mut writer = IsoWriter::new(options("EMPTY"));
    writer.add_file("/d1/d2/d3/d4/empty.dat", 0, None).unwrap();
    writer
        .write_and_close(&mut medium, |_| Ok(SliceSource::new(b"")))
        .unwrap();

    let mut fs = IsoFilesystem::open(medium, ReadPolicy::default()).unwrap();
    let entry = fs.entry("/d1/d2/d3/d4/empty.dat").unwrap();
    assert_eq!(entry.size(), 0);
    let content = fs.read_file(&entry).unwrap().read_to_end().unwrap();
    assert!(content.is_empty());
}

#[test]
fn short_file_stream_is_an_error() {
    let mut medium = medium();
    let mut writer = IsoWriter::new(options("SHORT"));
    writer.add_file("/data.bin", 10, None).unwrap();
    let result = writer.write_and_close(&mut medium, |_| Ok(SliceSource::new(b"only4")));
    assert!(matches!(result, Err(IsoError::PreconditionFailed(_))));
}

#[test]
fn enhanced_descriptor_uses_utf8_names() {
    let mut medium = medium();
    let mut writer = IsoWriter::new(WriterOptions {
        include_supplementary: false,
        include_enhanced: true,
        ..options("UTF8")
    });
    writer.add_file("/naïve-config.yaml", 3, None).unwrap();
    writer
        .write_and_close(&mut medium, |_| Ok(SliceSource::new(b"ok\n")))
        .unwrap();

    let mut fs = IsoFilesystem::open(
        medium,
        ReadPolicy::Enhanced(LookupStrategy::DirectoryRecords),
    )
    .unwrap();
    let entry = fs.entry("/naïve-config.yaml").unwrap();
    assert_eq!(entry.name(), "naïve-config.yaml");
}

#[test]
fn file_content_is_deduplicated_across_descriptors() {
    let mut medium = medium();
    let mut writer = IsoWriter::new(options("DEDUP"));
    writer.add_file("/shared.bin", 6, None).unwrap();
    let mut calls = 0;
    writer
        .write_and_close(&mut medium, |_| {
            calls += 1;
            Ok(SliceSource::new(b"shared"))
        })
        .unwrap();
    // One stream per logical file even with two descriptor views.
    assert_eq!(calls, 1);

    let mut primary = IsoFilesystem::open(
        medium.clone(),
        ReadPolicy::Primary(LookupStrategy::DirectoryRecords),
    )
    .unwrap();
    let primary_entry = primary.entry("/shared.bin").unwrap();
    let mut supplementary = IsoFilesystem::open(
        medium,
        ReadPolicy::Supplementary(LookupStrategy::DirectoryRecords),
    )
    .unwrap();
    let supplementary_entry = supplementary.entry("/shared.bin").unwrap();
    assert_eq!(
        primary_entry.metadata().record.extent_location,
        supplementary_entry.metadata().record.extent_location
    );
    assert_eq!(
        supplementary
            .read_file(&supplementary_entry)
            .unwrap()
            .read_to_end()
            .unwrap(),
        b"shared"
    );
}
