//! Tombstone pull, removal and renaming

use crate::common::{Harness, TOMBSTONES};

#[test]
fn test_tombstones_pulled_renamed_and_removed() {
    let h = Harness::new();
    h.device.write_file(&format!("{TOMBSTONES}/tombstone_00"), "first");
    h.device.write_file(&format!("{TOMBSTONES}/tombstone_01"), "second");

    let renamed = h.processor().tombstones().check_tombstones();

    assert_eq!(
        renamed,
        vec![
            h.upload.path().join("tombstone_00.1.txt"),
            h.upload.path().join("tombstone_01.1.txt"),
        ]
    );
    assert_eq!(
        std::fs::read_to_string(h.upload.path().join("tombstone_00.1.txt")).unwrap(),
        "first"
    );
    assert!(!h.device.has(TOMBSTONES));
}

#[test]
fn test_repeated_tombstone_names_never_overwrite() {
    let h = Harness::new();
    let processor = h.processor();

    for (pass, body) in ["first", "second", "third"].iter().enumerate() {
        h.device.write_file(&format!("{TOMBSTONES}/tombstone_03"), body);
        let renamed = processor.tombstones().check_tombstones();
        assert_eq!(
            renamed,
            vec![h.upload.path().join(format!("tombstone_03.{}.txt", pass + 1))]
        );
    }

    assert_eq!(
        h.upload_entries(),
        vec!["tombstone_03.1.txt", "tombstone_03.2.txt", "tombstone_03.3.txt"]
    );
    assert_eq!(
        std::fs::read_to_string(h.upload.path().join("tombstone_03.1.txt")).unwrap(),
        "first"
    );
    assert_eq!(
        std::fs::read_to_string(h.upload.path().join("tombstone_03.3.txt")).unwrap(),
        "third"
    );
}

#[test]
fn test_existing_copies_in_upload_dir_are_skipped() {
    let h = Harness::new();
    std::fs::write(h.upload.path().join("tombstone_01.1.txt"), "older").unwrap();
    h.device.write_file(&format!("{TOMBSTONES}/tombstone_01"), "newer");

    let renamed = h.processor().tombstones().check_tombstones();

    assert_eq!(renamed, vec![h.upload.path().join("tombstone_01.2.txt")]);
    assert_eq!(
        std::fs::read_to_string(h.upload.path().join("tombstone_01.1.txt")).unwrap(),
        "older"
    );
}

#[test]
fn test_missing_tombstone_directory_is_skipped() {
    let h = Harness::new();

    assert!(h.processor().tombstones().check_tombstones().is_empty());
    assert!(h.device.first_call("pull").is_none());
    assert!(h.device.first_call("remove").is_none());
}

#[test]
fn test_failed_pull_keeps_device_copy() {
    let h = Harness::new();
    h.device.write_file(&format!("{TOMBSTONES}/tombstone_02"), "keep me");
    h.device.fail("pull");

    assert!(h.processor().tombstones().check_tombstones().is_empty());
    assert_eq!(h.device.list(TOMBSTONES), vec!["tombstone_02"]);
}

#[test]
fn test_delete_tombstones_tolerates_missing_directory() {
    let h = Harness::new();

    h.processor().tombstones().delete_tombstones();

    assert_eq!(h.device.calls(), vec![format!("remove {TOMBSTONES}")]);
}
