//! Orchestration Tests
//!
//! End-to-end startup against a temporary config directory.

use std::time::Duration;

use chrono::Duration as ChronoDuration;
use pretty_assertions::assert_eq;

use modbot::application::services::{
    BlacklistService, PunishmentLedger, RatelimitService, RatelimitState, UnpunishService,
};
use modbot::config::{ConfigStore, CoreConfig};
use modbot::domain::{Punishment, PunishmentKind, PunishmentOrigin, ResultKind};
use modbot::infrastructure::transport::{Transport, TransportAction};

use crate::common::{file_names, TestApp};

const CONSTRUCTION_ORDER: [&str; 13] = [
    "ModerationService",
    "UsernoteService",
    "RecordService",
    "TagService",
    "ModLogService",
    "UnpunishService",
    "SlowmodeService",
    "RatelimitService",
    "BlacklistService",
    "AliasTrackingService",
    "PermissionsService",
    "Transport",
    "CoreConfig",
];

/// Test a fresh directory produces every artifact and a fully populated registry
#[tokio::test]
async fn test_fresh_directory_starts_cleanly() {
    // Arrange
    let test_app = TestApp::new();

    // Act
    let app = test_app.spawn().await;

    // Assert
    assert_eq!(
        file_names(&test_app.config_dir()),
        vec![
            "aliases.json",
            "blacklist.json",
            "core.json",
            "moderation.json",
            "modlog.json",
            "permissions.json",
            "punishments.json",
            "ratelimit.json",
        ]
    );
    assert_eq!(app.registry().len(), 13);
    assert_eq!(app.ready_hooks().runs(), 1);
    assert!(app.is_started());
    assert!(test_app.transport.is_started());

    test_app.wait_for_console("Unpunisher started").await;
    let console = test_app.console.contents();
    assert!(!console.contains("[Critical]"), "{}", console);
    assert!(!console.contains("[Error]"), "{}", console);
    assert!(file_names(&test_app.log_dir()).is_empty());

    app.stop().await;
}

/// Test subsystems are registered in construction order
#[tokio::test]
async fn test_subsystems_constructed_in_dependency_order() {
    let test_app = TestApp::new();

    let app = test_app.build().await.unwrap();

    let names = app.registry().names();
    assert_eq!(names, &CONSTRUCTION_ORDER[..]);

    // (dependent, dependency)
    let pairs = [
        ("UnpunishService", "ModLogService"),
        ("UnpunishService", "RecordService"),
        ("SlowmodeService", "UnpunishService"),
        ("RatelimitService", "UnpunishService"),
        ("BlacklistService", "UnpunishService"),
        ("BlacklistService", "ModLogService"),
    ];
    let position = |name: &str| names.iter().position(|n| *n == name).unwrap();
    for (dependent, dependency) in pairs {
        assert!(
            position(dependency) < position(dependent),
            "{} was constructed before {}",
            dependent,
            dependency
        );
    }

    let unpunish = app.registry().require::<UnpunishService>().unwrap();
    assert!(unpunish.has_blacklist());
    assert!(app.registry().contains::<BlacklistService>());
    assert!(app.registry().get::<std::sync::Arc<dyn Transport>>().is_some());
    assert!(app.registry().get::<CoreConfig>().is_some());

    app.stop().await;
}

/// Test the blacklist waits for the transport before loading
#[tokio::test]
async fn test_blacklist_loads_only_after_ready() {
    let test_app = TestApp::new();

    let mut app = test_app.build().await.unwrap();
    assert!(!test_app.config_path("blacklist").exists());
    assert_eq!(app.ready_hooks().pending(), 1);

    app.start().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), app.ready_hooks().wait())
        .await
        .unwrap();

    let contents = std::fs::read_to_string(test_app.config_path("blacklist")).unwrap();
    let config: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(config["guild_id"], 1u64);

    app.stop().await;
}

/// Test starting twice is refused
#[tokio::test]
async fn test_second_start_is_refused() {
    let test_app = TestApp::new();
    let mut app = test_app.spawn().await;

    let second = app.start().await;

    assert_eq!(second.unwrap_err().kind(), "ConnectFailure");
    assert_eq!(app.ready_hooks().runs(), 1);

    app.stop().await;
}

/// Test a malformed credential stops startup before the unpunisher runs
#[tokio::test]
async fn test_connect_failure_is_fatal() {
    let test_app = TestApp::new();
    test_app.seed("core", r#"{ "token": "not a token" }"#);
    let mut app = test_app.build().await.unwrap();

    let err = app.start().await.unwrap_err();

    assert_eq!(err.kind(), "ConnectFailure");
    assert!(!app.is_started());
    assert!(!test_app.transport.is_started());
    assert_eq!(app.ready_hooks().runs(), 0);

    app.stop().await;
}

/// Test a blacklist with no guild to bind to is logged, not fatal
#[tokio::test]
async fn test_deferred_hook_failure_is_logged_not_fatal() {
    let test_app = TestApp::with_guilds(Vec::new());

    let app = test_app.spawn().await;

    let line = test_app.wait_for_console("Ready hook blacklist failed").await;
    assert!(line.contains("[Error]"));
    test_app.wait_for_console("^ DeferredHookFailure occurred.").await;
    let reports = file_names(&test_app.log_dir());
    assert_eq!(reports.len(), 1);
    assert!(reports[0].ends_with(" DeferredHookFailure.txt"));

    assert!(app.is_started());
    assert_eq!(app.ready_hooks().runs(), 1);
    assert_eq!(
        app.dispatcher().authorize(&[], "ban").kind(),
        ResultKind::Failure
    );

    app.stop().await;
}

/// Test an enabled rate limit in persisted config is activated at startup
#[tokio::test]
async fn test_ratelimit_activated_from_persisted_config() {
    let test_app = TestApp::new();
    test_app.seed("ratelimit", r#"{ "is_enabled": true, "limit": 7 }"#);

    let app = test_app.build().await.unwrap();

    let ratelimit = app.registry().require::<RatelimitService>().unwrap();
    assert_eq!(ratelimit.state(), RatelimitState::Enabled { limit: 7 });

    app.stop().await;
}

/// Test the rate limit stays off by default
#[tokio::test]
async fn test_ratelimit_disabled_by_default() {
    let test_app = TestApp::new();

    let app = test_app.build().await.unwrap();

    let ratelimit = app.registry().require::<RatelimitService>().unwrap();
    assert_eq!(ratelimit.state(), RatelimitState::Disabled);

    app.stop().await;
}

/// Test commands are authorized through the registered permissions
#[tokio::test]
async fn test_dispatcher_uses_configured_permissions() {
    let test_app = TestApp::new();
    test_app.seed(
        "permissions",
        r#"{ "roles": { "5": ["mod.ban"], "6": ["all"] } }"#,
    );

    let app = test_app.build().await.unwrap();
    let dispatcher = app.dispatcher();

    assert!(dispatcher.is_installed());
    assert_eq!(dispatcher.authorize(&[5], "ban").render(), ":ok: Granted `mod.ban`");
    assert_eq!(dispatcher.authorize(&[6], "mute").kind(), ResultKind::Warning);
    assert_eq!(dispatcher.authorize(&[5], "mute").kind(), ResultKind::Failure);

    app.stop().await;
}

/// Test the transport's own log feed is rendered on the console
#[tokio::test]
async fn test_transport_log_feed_reaches_console() {
    let test_app = TestApp::new();

    let app = test_app.spawn().await;

    let line = test_app.wait_for_console("Connected").await;
    assert_eq!(&line[8..], " [Info]     Gateway:    Connected");

    app.stop().await;
}

/// Test punishments that expired while the process was down are lifted on start
#[tokio::test]
async fn test_expired_punishment_lifted_after_restart() {
    let test_app = TestApp::new();
    let expired = Punishment::new(
        1,
        500,
        PunishmentKind::Mute,
        PunishmentOrigin::Moderator,
        "spam",
        ChronoDuration::minutes(-5),
    )
    .unwrap();
    let store = ConfigStore::new(test_app.config_dir());
    store.ensure_exists().await.unwrap();
    store
        .save(
            "punishments",
            &PunishmentLedger {
                punishments: vec![expired.clone()],
            },
        )
        .await
        .unwrap();

    let app = test_app.spawn().await;
    let unpunish = app.registry().require::<UnpunishService>().unwrap();

    let mut outstanding = unpunish.outstanding().await.len();
    for _ in 0..200 {
        if outstanding == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        outstanding = unpunish.outstanding().await.len();
    }

    assert_eq!(outstanding, 0);
    assert!(test_app
        .transport
        .actions()
        .contains(&TransportAction::Lift(expired.id)));

    app.stop().await;
}
