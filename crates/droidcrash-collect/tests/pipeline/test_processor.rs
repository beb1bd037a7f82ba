//! End-to-end error collection across all stages

use droidcrash_collect::{CrashProcessor, DEFAULT_MAX_DUMPS};
use droidcrash_core::config::ConfigBuilder;
use droidcrash_core::domain::ErrorReport;

use crate::common::{Harness, MINIDUMP_DIR, PROFILE_DIR, TOMBSTONES, TRACES};

const MARKER: &str = "01-30 20:15:41.937 E/GeckoAppShell( 1703): >>> REPORTING UNCAUGHT EXCEPTION FROM THREAD 9 (\"GeckoBackgroundThread\")";
const TYPE_LINE: &str = "01-30 20:15:41.937 E/GeckoAppShell( 1703): java.lang.NullPointerException";
const LOCATION_LINE: &str =
    "01-30 20:15:41.937 E/GeckoAppShell( 1703): \tat org.mozilla.gecko.GeckoApp$21.run(GeckoApp.java:1833)";

#[test]
fn test_java_exception_comes_before_process_crashes() {
    let h = Harness::new();
    h.device.set_event_log(&[MARKER, TYPE_LINE, LOCATION_LINE]);
    h.add_dump(MINIDUMP_DIR, "0f1e", true);

    let errors = h
        .processor()
        .collect_errors(Some(&h.symbols()), Some(&h.stackwalk()), true);

    let reasons: Vec<&str> = errors.iter().map(ErrorReport::reason).collect();
    assert_eq!(reasons, vec!["java-exception", "PROCESS-CRASH"]);
    assert_eq!(errors[1].signature(), "@ libxul.so!mozilla::Crash()");
}

#[test]
fn test_stages_run_in_order() {
    let h = Harness::new();
    h.device.write_file(TRACES, "trace");
    h.device.write_file(&format!("{TOMBSTONES}/tombstone_00"), "tomb");
    h.add_dump(MINIDUMP_DIR, "0f1e", false);

    h.processor()
        .collect_errors(Some(&h.symbols()), Some(&h.stackwalk()), true);

    let logcat = h.device.first_call("logcat").unwrap();
    let anr = h.device.first_call(&format!("exists {TRACES}")).unwrap();
    let tombstones = h.device.first_call(&format!("exists {TOMBSTONES}")).unwrap();
    let dumps = h.device.first_call(&format!("is_dir {MINIDUMP_DIR}")).unwrap();
    assert!(logcat < anr);
    assert!(anr < tombstones);
    assert!(tombstones < dumps);

    assert_eq!(
        h.upload_entries(),
        vec!["0f1e.dmp", "tombstone_00.1.txt", "traces.txt"]
    );
}

#[test]
fn test_anr_and_tombstones_collected_without_crash_directory() {
    let h = Harness::new();
    h.device.write_file(TRACES, "trace");
    h.device.write_file(&format!("{TOMBSTONES}/tombstone_04"), "tomb");

    let errors = h
        .processor()
        .collect_errors(Some(&h.symbols()), Some(&h.stackwalk()), true);

    assert!(errors.is_empty());
    assert_eq!(h.upload_entries(), vec!["tombstone_04.1.txt", "traces.txt"]);
}

#[test]
fn test_missing_crash_directory_reported_when_enabled() {
    let h = Harness::new();
    let mut settings = h.settings();
    settings.report_missing_crash_dir = true;

    let errors = h
        .processor_with(settings)
        .get_crashes(Some(&h.symbols()), Some(&h.stackwalk()), true);

    assert_eq!(
        errors,
        vec![ErrorReport::ProfileError {
            signature: format!("No crash directory ({MINIDUMP_DIR}) found on remote device"),
        }]
    );
}

#[test]
fn test_missing_profile_reported_when_enabled() {
    let h = Harness::new();
    let mut settings = h.settings();
    settings.profile_dir = None;
    settings.report_missing_crash_dir = true;

    let errors = h
        .processor_with(settings)
        .get_crashes(Some(&h.symbols()), Some(&h.stackwalk()), true);

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].signature(),
        "No crash directory (None) found on remote device"
    );
}

#[test]
fn test_nothing_on_device_yields_empty_list() {
    let h = Harness::new();

    let errors = h
        .processor()
        .collect_errors(Some(&h.symbols()), Some(&h.stackwalk()), true);

    assert!(errors.is_empty());
    assert!(h.upload_entries().is_empty());
}

#[test]
fn test_clearing_absent_artifacts_leaves_upload_untouched() {
    let h = Harness::new();
    std::fs::write(h.upload.path().join("earlier.dmp"), "MDMP").unwrap();
    let processor = h.processor();

    processor.anr().clear_anr_traces();
    processor.tombstones().delete_tombstones();
    processor.dumps().delete_crash_dumps();

    assert_eq!(h.upload_entries(), vec!["earlier.dmp"]);
}

#[test]
fn test_clean_device_yields_no_errors() {
    let h = Harness::new();
    h.device.mkdir(MINIDUMP_DIR);

    let errors = h
        .processor()
        .collect_errors(Some(&h.symbols()), Some(&h.stackwalk()), true);

    assert!(errors.is_empty());
    assert!(h.upload_entries().is_empty());
}

#[test]
fn test_second_pass_reports_nothing_new_after_clean() {
    let h = Harness::new();
    h.add_dump(MINIDUMP_DIR, "0f1e", true);
    let processor = h.processor();

    let first = processor.get_crashes(Some(&h.symbols()), Some(&h.stackwalk()), true);
    let second = processor.get_crashes(Some(&h.symbols()), Some(&h.stackwalk()), true);

    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
}

#[test]
fn test_clear_all_resets_device_state() {
    let h = Harness::new();
    h.device.write_file(TRACES, "stale trace");
    h.device.write_file(&format!("{TOMBSTONES}/tombstone_00"), "stale");
    h.add_dump(MINIDUMP_DIR, "0f1e", true);

    h.processor().clear_all();

    assert_eq!(h.device.read_file(TRACES).as_deref(), Some("\n"));
    assert!(!h.device.has(TOMBSTONES));
    assert!(h.device.list(MINIDUMP_DIR).is_empty());
    assert!(h.upload_entries().is_empty());
    assert!(h.symbolicator.calls().is_empty());
}

#[test]
fn test_from_config() {
    let h = Harness::new();
    let config = ConfigBuilder::new()
        .device_serial("emulator-5554")
        .app_package("org.mozilla.fennec_aurora")
        .app_profile_dir(PROFILE_DIR)
        .crash_upload_dir(h.upload.path().to_path_buf())
        .crash_max_dumps(2)
        .build();

    let processor = CrashProcessor::from_config(h.device.clone(), &config).unwrap();

    assert_eq!(processor.dumps().max_dumps(), 2);
    assert_eq!(
        processor.dumps().minidump_dir().map(|d| d.as_str()),
        Some(MINIDUMP_DIR)
    );
    assert_eq!(
        processor.dumps().pending_dir().as_str(),
        "/data/data/org.mozilla.fennec_aurora/files/mozilla/Crash Reports/pending"
    );
}

#[test]
fn test_from_config_rejects_bad_package() {
    let h = Harness::new();
    let config = ConfigBuilder::new().app_package("not a package").build();

    assert!(CrashProcessor::from_config(h.device.clone(), &config).is_err());
}

#[test]
fn test_default_dump_bound() {
    let h = Harness::new();
    assert_eq!(h.processor().dumps().max_dumps(), DEFAULT_MAX_DUMPS);
}
