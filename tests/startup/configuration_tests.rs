//! Configuration Tests
//!
//! Startup behavior against existing, edited and corrupt artifacts.

use tokio_test::{assert_err, assert_ok};

use modbot::application::services::ModerationService;
use modbot::config::CoreConfig;

use crate::common::{file_names, TestApp};

/// Test a second startup reuses every artifact without rewriting it
#[tokio::test]
async fn test_restart_is_idempotent() {
    let test_app = TestApp::new();
    test_app.spawn().await.stop().await;
    let snapshot: Vec<(String, String)> = file_names(&test_app.config_dir())
        .into_iter()
        .map(|name| {
            let contents = std::fs::read_to_string(test_app.config_dir().join(&name)).unwrap();
            (name, contents)
        })
        .collect();

    let app = test_app.build().await;
    let app = assert_ok!(app);

    for (name, contents) in &snapshot {
        let current = std::fs::read_to_string(test_app.config_dir().join(name)).unwrap();
        assert_eq!(&current, contents, "{} was rewritten", name);
    }
    assert_eq!(app.registry().len(), 13);

    app.stop().await;
}

/// Test a corrupt subsystem artifact aborts startup and is left as found
#[tokio::test]
async fn test_corrupt_subsystem_config_is_fatal() {
    let test_app = TestApp::new();
    test_app.seed("moderation", "{ not json");

    let result = test_app.build().await;

    let err = assert_err!(result);
    assert_eq!(err.kind(), "ConfigCorrupt");
    assert_eq!(
        std::fs::read_to_string(test_app.config_path("moderation")).unwrap(),
        "{ not json"
    );
    // Nothing after the failing subsystem was created
    assert!(!test_app.config_path("modlog").exists());
}

/// Test a corrupt core artifact aborts startup
#[tokio::test]
async fn test_corrupt_core_config_is_fatal() {
    let test_app = TestApp::new();
    test_app.seed("core", "[1, 2");

    let err = assert_err!(test_app.build().await);

    assert_eq!(err.kind(), "ConfigCorrupt");
    assert!(!test_app.config_path("moderation").exists());
}

/// Test out-of-range settings are rejected as corrupt
#[tokio::test]
async fn test_invalid_setting_is_fatal() {
    let test_app = TestApp::new();
    test_app.seed("ratelimit", r#"{ "limit": 0 }"#);

    let err = assert_err!(test_app.build().await);

    assert_eq!(err.kind(), "ConfigCorrupt");
}

/// Test a mute length chrono cannot represent stops startup instead of a later panic
#[tokio::test]
async fn test_unrepresentable_mute_length_is_fatal() {
    let test_app = TestApp::new();
    test_app.seed(
        "ratelimit",
        r#"{ "is_enabled": true, "limit": 1, "mute_minutes": 1000000000000 }"#,
    );

    let err = assert_err!(test_app.build().await);

    assert_eq!(err.kind(), "ConfigCorrupt");
}

/// Test an unwritable config location is an I/O failure
#[tokio::test]
async fn test_unwritable_config_dir_is_io_failure() {
    let test_app = TestApp::new();
    // A regular file where the directory should be
    std::fs::write(test_app.config_dir(), "").unwrap();

    let err = assert_err!(test_app.build().await);

    assert_eq!(err.kind(), "IoFailure");
}

/// Test operator edits are picked up by the subsystems
#[tokio::test]
async fn test_operator_settings_are_applied() {
    let test_app = TestApp::new();
    test_app.seed(
        "core",
        r#"{ "token": "abc", "owner_id": 42, "failure_log_dir": "reports" }"#,
    );
    test_app.seed("moderation", r#"{ "mute_role_id": 9 }"#);

    let app = assert_ok!(test_app.build().await);

    assert_eq!(app.core().owner_id, Some(42));
    assert_eq!(app.sink().failure_dir(), test_app.dir.path().join("reports"));
    let core = app.registry().require::<CoreConfig>().unwrap();
    assert_eq!(core.token, "abc");
    let moderation = app.registry().require::<ModerationService>().unwrap();
    assert_eq!(moderation.mute_role(), Some(9));

    app.stop().await;
}
