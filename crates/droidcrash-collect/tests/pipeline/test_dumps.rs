//! Minidump pull, bounding and analysis

use droidcrash_collect::DumpPull;
use droidcrash_core::domain::{DevicePath, ErrorReport, UNKNOWN_TOP_FRAME};
use droidcrash_core::ports::SymbolicatorOutput;

use crate::common::{FakeSymbolicator, Harness, MINIDUMP_DIR, PENDING_DIR};

fn signatures(pull: DumpPull) -> Vec<String> {
    pull.into_reports()
        .iter()
        .map(|r| r.signature().to_string())
        .collect()
}

#[test]
fn test_dumps_analyzed_and_copied_to_upload() {
    let h = Harness::new();
    h.add_dump(MINIDUMP_DIR, "0f1e", true);
    h.add_dump(MINIDUMP_DIR, "a2b3", false);

    let pull = h
        .processor()
        .dumps()
        .pull_dumps(Some(&h.symbols()), Some(&h.stackwalk()), true);

    let DumpPull::Collected(reports) = pull else {
        panic!("expected collected dumps");
    };
    assert_eq!(reports.len(), 2);
    for report in &reports {
        assert_eq!(report.reason(), "PROCESS-CRASH");
        assert_eq!(report.signature(), "@ libxul.so!mozilla::Crash()");
    }
    assert_eq!(
        h.upload_entries(),
        vec!["0f1e.dmp", "0f1e.extra", "a2b3.dmp"]
    );
}

#[test]
fn test_clean_empties_minidump_directory() {
    let h = Harness::new();
    h.add_dump(MINIDUMP_DIR, "0f1e", true);

    h.processor()
        .dumps()
        .pull_dumps(Some(&h.symbols()), Some(&h.stackwalk()), true);

    assert!(h.device.has(MINIDUMP_DIR));
    assert!(h.device.list(MINIDUMP_DIR).is_empty());
}

#[test]
fn test_no_clean_leaves_device_untouched() {
    let h = Harness::new();
    h.add_dump(MINIDUMP_DIR, "0f1e", true);

    let pull = h
        .processor()
        .dumps()
        .pull_dumps(Some(&h.symbols()), Some(&h.stackwalk()), false);

    assert_eq!(pull.into_reports().len(), 1);
    assert_eq!(h.device.list(MINIDUMP_DIR), vec!["0f1e.dmp", "0f1e.extra"]);
    assert!(h.device.first_call("remove").is_none());
}

#[test]
fn test_pending_reports_are_collected() {
    let h = Harness::new();
    h.device.mkdir(MINIDUMP_DIR);
    h.add_dump(PENDING_DIR, "pending1", true);

    let pull = h
        .processor()
        .dumps()
        .pull_dumps(Some(&h.symbols()), Some(&h.stackwalk()), true);

    assert_eq!(pull.into_reports().len(), 1);
    assert_eq!(h.upload_entries(), vec!["pending1.dmp", "pending1.extra"]);
    assert!(h.device.list(PENDING_DIR).is_empty());
}

#[test]
fn test_both_sources_processed_once_in_name_order() {
    let h = Harness::new();
    h.add_dump(MINIDUMP_DIR, "bbbb", true);
    h.add_dump(PENDING_DIR, "aaaa", true);

    h.processor()
        .dumps()
        .pull_dumps(Some(&h.symbols()), Some(&h.stackwalk()), true);

    let analyzed: Vec<String> = h
        .symbolicator
        .calls()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(analyzed, vec!["aaaa.dmp", "bbbb.dmp"]);
}

#[test]
fn test_dump_count_is_bounded() {
    let h = Harness::new();
    for i in 0..12 {
        h.add_dump(MINIDUMP_DIR, &format!("dump{i:02}"), false);
    }

    let pull = h
        .processor()
        .dumps()
        .pull_dumps(Some(&h.symbols()), Some(&h.stackwalk()), true);

    assert_eq!(pull.into_reports().len(), 10);
    assert_eq!(h.symbolicator.calls().len(), 10);
    let uploaded = h.upload_entries();
    assert_eq!(uploaded.len(), 10);
    assert_eq!(uploaded.first().map(String::as_str), Some("dump00.dmp"));
    assert_eq!(uploaded.last().map(String::as_str), Some("dump09.dmp"));
}

#[test]
fn test_configured_bound_is_honored() {
    let h = Harness::new();
    for i in 0..4 {
        h.add_dump(MINIDUMP_DIR, &format!("dump{i}"), false);
    }
    let mut settings = h.settings();
    settings.max_dumps = 3;

    let pull = h
        .processor_with(settings)
        .dumps()
        .pull_dumps(Some(&h.symbols()), Some(&h.stackwalk()), true);

    assert_eq!(pull.into_reports().len(), 3);
}

#[test]
fn test_staging_directory_is_removed() {
    let h = Harness::new();
    h.add_dump(MINIDUMP_DIR, "0f1e", true);

    h.processor()
        .dumps()
        .pull_dumps(Some(&h.symbols()), Some(&h.stackwalk()), true);

    let staged = h.symbolicator.calls();
    assert_eq!(staged.len(), 1);
    let staging = staged[0].parent().unwrap();
    assert_ne!(staging, h.upload.path());
    assert!(!staging.exists());
}

#[test]
fn test_missing_minidump_directory() {
    let h = Harness::new();

    let pull = h
        .processor()
        .dumps()
        .pull_dumps(Some(&h.symbols()), Some(&h.stackwalk()), true);

    assert_eq!(
        pull,
        DumpPull::NoCrashDirectory {
            dir: Some(DevicePath::new(MINIDUMP_DIR).unwrap()),
        }
    );
    assert!(h.device.first_call("pull").is_none());
}

#[test]
fn test_no_profile_directory() {
    let h = Harness::new();
    let mut settings = h.settings();
    settings.profile_dir = None;

    let pull = h
        .processor_with(settings)
        .dumps()
        .pull_dumps(Some(&h.symbols()), Some(&h.stackwalk()), true);

    assert_eq!(pull, DumpPull::NoCrashDirectory { dir: None });
}

#[test]
fn test_empty_minidump_directory_yields_no_reports() {
    let h = Harness::new();
    h.device.mkdir(MINIDUMP_DIR);

    let pull = h
        .processor()
        .dumps()
        .pull_dumps(Some(&h.symbols()), Some(&h.stackwalk()), true);

    assert_eq!(pull, DumpPull::Collected(Vec::new()));
}

#[test]
fn test_failed_pull_keeps_device_dumps() {
    let h = Harness::new();
    h.add_dump(MINIDUMP_DIR, "0f1e", true);
    h.device.fail("pull");

    let pull = h
        .processor()
        .dumps()
        .pull_dumps(Some(&h.symbols()), Some(&h.stackwalk()), true);

    assert!(pull.into_reports().is_empty());
    assert_eq!(h.device.list(MINIDUMP_DIR), vec!["0f1e.dmp", "0f1e.extra"]);
}

#[test]
fn test_missing_symbols_still_reports_crash() {
    let h = Harness::new();
    h.add_dump(MINIDUMP_DIR, "0f1e", false);

    let reports = h
        .processor()
        .dumps()
        .pull_dumps(None, Some(&h.stackwalk()), true)
        .into_reports();

    assert!(h.symbolicator.calls().is_empty());
    let [ErrorReport::ProcessCrash {
        signature,
        stackwalk_errors,
        ..
    }] = reports.as_slice()
    else {
        panic!("expected one process crash, got {reports:?}");
    };
    assert_eq!(signature, UNKNOWN_TOP_FRAME);
    assert_eq!(stackwalk_errors, "No symbols path given, can't process dump.");
}

#[test]
fn test_missing_stackwalk_binary_reported() {
    let h = Harness::new();
    h.add_dump(MINIDUMP_DIR, "0f1e", false);
    let binary = h.symbols().join("no-such-walker");

    let reports = h
        .processor()
        .dumps()
        .pull_dumps(Some(&h.symbols()), Some(&binary), true)
        .into_reports();

    assert_eq!(reports.len(), 1);
    let ErrorReport::ProcessCrash {
        signature,
        stackwalk_errors,
        ..
    } = &reports[0]
    else {
        panic!("expected a process crash");
    };
    assert_eq!(signature, UNKNOWN_TOP_FRAME);
    assert!(h.symbolicator.calls().is_empty());
    assert_eq!(
        stackwalk_errors,
        &format!("MINIDUMP_STACKWALK binary not found: {}", binary.display())
    );
}

#[test]
fn test_unrecognized_output_gets_unknown_signature() {
    let h = Harness::with_symbolicator(FakeSymbolicator::new(SymbolicatorOutput {
        stdout: "Thread 0 (crashed)\n".into(),
        stderr: String::new(),
        exit_code: Some(0),
    }));
    h.add_dump(MINIDUMP_DIR, "0f1e", false);
    h.add_dump(MINIDUMP_DIR, "1a2b", false);

    let pull = h
        .processor()
        .dumps()
        .pull_dumps(Some(&h.symbols()), Some(&h.stackwalk()), true);

    assert_eq!(signatures(pull), vec![UNKNOWN_TOP_FRAME, UNKNOWN_TOP_FRAME]);
}

#[test]
fn test_delete_crash_dumps() {
    let h = Harness::new();
    h.add_dump(MINIDUMP_DIR, "0f1e", true);

    h.processor().dumps().delete_crash_dumps();

    assert!(h.device.list(MINIDUMP_DIR).is_empty());
    assert!(h.upload_entries().is_empty());
}

#[test]
fn test_failed_upload_copy_does_not_block_remaining_dumps() {
    let h = Harness::new();
    h.add_dump(MINIDUMP_DIR, "a", true);
    h.add_dump(MINIDUMP_DIR, "b", true);
    // A directory in the way makes copying a.dmp fail.
    std::fs::create_dir(h.upload.path().join("a.dmp")).unwrap();

    let reports = h
        .processor()
        .dumps()
        .pull_dumps(Some(&h.symbols()), Some(&h.stackwalk()), true)
        .into_reports();

    assert_eq!(reports.len(), 2);
    let outputs: Vec<&str> = reports
        .iter()
        .map(|r| match r {
            ErrorReport::ProcessCrash {
                stackwalk_output, ..
            } => stackwalk_output.as_str(),
            other => panic!("unexpected report {other:?}"),
        })
        .collect();
    assert!(outputs[0].lines().next().unwrap().ends_with("a.dmp"));
    assert!(outputs[1].lines().next().unwrap().ends_with("b.dmp"));

    let analyzed: Vec<String> = h
        .symbolicator
        .calls()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(analyzed, vec!["a.dmp", "b.dmp"]);
    assert_eq!(
        h.upload_entries(),
        vec!["a.dmp", "a.extra", "b.dmp", "b.extra"]
    );
    assert!(h.upload.path().join("a.dmp").is_dir());
}
