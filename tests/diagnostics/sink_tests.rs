//! Diagnostic Sink Tests
//!
//! Console serialization and failure-report persistence under concurrency.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

use modbot::telemetry::{render_line, DiagnosticMessage, DiagnosticSink, FailureReport, Severity};

use crate::common::{file_names, SharedBuffer};

/// Test concurrent emitters never interleave lines, including report pointers
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_emits_keep_lines_whole() {
    let dir = tempfile::tempdir().unwrap();
    let console = SharedBuffer::default();
    let sink = Arc::new(DiagnosticSink::with_writer(console.clone(), dir.path(), false));

    // Odd workers attach a failure to every fifth message
    let tasks: Vec<_> = (0..8)
        .map(|worker| {
            let sink = sink.clone();
            tokio::spawn(async move {
                for n in 0..25 {
                    let source = format!("Worker{}", worker);
                    let message = if worker % 2 == 1 && n % 5 == 0 {
                        DiagnosticMessage::error(source.clone(), format!("failure {}", n))
                            .with_failure(FailureReport::new(format!("{}-{}", source, n), "details"))
                    } else {
                        DiagnosticMessage::info(source, format!("message {}", n))
                    };
                    sink.log(message).await;
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let lines = console.lines();
    assert_eq!(lines.len(), 200 + 20);
    assert_eq!(file_names(dir.path()).len(), 20);
    for (i, line) in lines.iter().enumerate() {
        if let Some(pointer) = line.strip_prefix("^ ") {
            // The pointer must sit directly under the message that caused it
            let kind = pointer.split(' ').next().unwrap();
            let (source, n) = kind.split_once('-').unwrap();
            let previous = &lines[i - 1];
            assert_eq!(&previous[8..20], " [Error]    ", "{}", previous);
            assert!(previous[20..].starts_with(&format!("{}:", source)), "{}", previous);
            assert!(previous.ends_with(&format!("failure {}", n)), "{}", previous);
            continue;
        }

        assert!(line[20..].starts_with("Worker"), "{}", line);
        if &line[8..20] == " [Error]    " {
            assert!(lines[i + 1].starts_with("^ "), "{}", line);
        } else {
            assert_eq!(&line[8..20], " [Info]     ", "{}", line);
            assert!(line.contains("message "), "{}", line);
        }
    }
}

/// Test messages from another source render exactly like internal ones
#[tokio::test]
async fn test_external_messages_render_identically() {
    let timestamp = Utc.with_ymd_and_hms(2024, 3, 9, 8, 4, 2).unwrap();
    let internal = DiagnosticMessage::warning("Gateway", "Reconnecting");
    let external = DiagnosticMessage::new(Severity::Warning, "Gateway", "Reconnecting");

    assert_eq!(render_line(timestamp, &internal), render_line(timestamp, &external));
    assert_eq!(
        render_line(timestamp, &internal),
        "08:04:02 [Warning]  Gateway:    Reconnecting"
    );
}

/// Test distinct failure kinds in the same second get distinct files
#[tokio::test]
async fn test_distinct_failures_get_distinct_files() {
    let dir = tempfile::tempdir().unwrap();
    let console = SharedBuffer::default();
    let sink = DiagnosticSink::with_writer(console.clone(), dir.path().join("logs"), false);
    let timestamp = Utc.with_ymd_and_hms(2024, 3, 9, 8, 4, 2).unwrap();

    for kind in ["ConfigCorrupt", "ConnectFailure"] {
        let path = sink
            .emit_at(
                timestamp,
                DiagnosticMessage::critical("Startup", "Startup failed")
                    .with_failure(FailureReport::new(kind, "details").with_trace("cause")),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            format!("{}: details\n   ---> cause", kind)
        );
    }

    assert_eq!(
        file_names(&dir.path().join("logs")),
        vec![
            "09-03-2024 08-04-02 ConfigCorrupt.txt",
            "09-03-2024 08-04-02 ConnectFailure.txt",
        ]
    );
    // Two console lines per failure: the entry and the pointer to its report
    assert_eq!(console.lines().len(), 4);
}

/// Test the console line survives an unusable failure directory
#[tokio::test]
async fn test_console_written_when_report_cannot_be_saved() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("logs");
    std::fs::write(&blocker, "not a directory").unwrap();
    let console = SharedBuffer::default();
    let sink = DiagnosticSink::with_writer(console.clone(), &blocker, false);

    let result = sink
        .emit(
            DiagnosticMessage::error("Unpunish", "Failed to lift punishment")
                .with_failure(FailureReport::new("TransportError", "offline")),
        )
        .await;

    assert!(result.is_err());
    let lines = console.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("Unpunish:   Failed to lift punishment"));
}
