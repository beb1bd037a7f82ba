//! Event log scanning for uncaught Java exceptions

use droidcrash_core::domain::ErrorReport;

use crate::common::Harness;

const MARKER: &str = r#"01-30 20:15:41.937 E/GeckoAppShell( 1703): >>> REPORTING UNCAUGHT EXCEPTION FROM THREAD 9 ("GeckoBackgroundThread")"#;
const TYPE_LINE: &str = "01-30 20:15:41.937 E/GeckoAppShell( 1703): java.lang.NullPointerException";
const LOCATION_LINE: &str = "01-30 20:15:41.937 E/GeckoAppShell( 1703): \tat org.mozilla.gecko.GeckoApp$21.run(GeckoApp.java:1833)";

#[test]
fn test_exception_reported_from_event_log() {
    let h = Harness::new();
    h.device.set_event_log(&[
        "01-30 20:15:40.000 I/GeckoApp( 1703): starting",
        MARKER,
        TYPE_LINE,
        LOCATION_LINE,
        "01-30 20:15:41.938 E/GeckoAppShell( 1703): \tat android.os.Handler.handleCallback(Handler.java:615)",
    ]);

    let report = h.processor().java_scanner().get_java_exception();

    assert_eq!(
        report,
        Some(ErrorReport::JavaException {
            signature: "java.lang.NullPointerException at org.mozilla.gecko.GeckoApp$21.run(GeckoApp.java:1833)".into(),
        })
    );
}

#[test]
fn test_fatal_exception_marker() {
    let h = Harness::new();
    h.device.set_event_log(&[
        "01-30 20:15:41.937 E/AndroidRuntime( 1703): FATAL EXCEPTION: main",
        "01-30 20:15:41.937 E/AndroidRuntime( 1703): java.lang.IllegalStateException: boom",
        "01-30 20:15:41.937 E/AndroidRuntime( 1703): \tat org.mozilla.gecko.Foo.bar(Foo.java:10)",
    ]);

    let report = h.processor().java_scanner().get_java_exception().unwrap();

    assert_eq!(
        report.signature(),
        "java.lang.IllegalStateException: boom at org.mozilla.gecko.Foo.bar(Foo.java:10)"
    );
}

#[test]
fn test_truncated_log_yields_nothing() {
    let h = Harness::new();
    h.device.set_event_log(&[MARKER, TYPE_LINE]);

    assert_eq!(h.processor().java_scanner().get_java_exception(), None);
}

#[test]
fn test_clean_log_yields_nothing() {
    let h = Harness::new();
    h.device
        .set_event_log(&["01-30 20:15:40.000 I/GeckoApp( 1703): all good"]);

    assert_eq!(h.processor().java_scanner().get_java_exception(), None);
}

#[test]
fn test_event_log_failure_yields_nothing() {
    let h = Harness::new();
    h.device.set_event_log(&[MARKER, TYPE_LINE, LOCATION_LINE]);
    h.device.fail("logcat");

    assert_eq!(h.processor().java_scanner().get_java_exception(), None);
}
