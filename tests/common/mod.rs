//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;

use modbot::config::ConfigStore;
use modbot::infrastructure::transport::{LoopbackTransport, LOOPBACK_GUILD_ID};
use modbot::shared::StartupError;
use modbot::startup::Application;
use modbot::telemetry::DiagnosticSink;

/// Console writer whose output can be inspected after the fact
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Test application rooted in its own temporary directory
pub struct TestApp {
    pub dir: TempDir,
    pub console: SharedBuffer,
    pub transport: Arc<LoopbackTransport>,
}

impl TestApp {
    /// Fresh directory, transport reporting one guild
    pub fn new() -> Self {
        Self::with_guilds(vec![LOOPBACK_GUILD_ID])
    }

    pub fn with_guilds(guilds: Vec<u64>) -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
            console: SharedBuffer::default(),
            transport: Arc::new(LoopbackTransport::new(guilds)),
        }
    }

    pub fn config_dir(&self) -> PathBuf {
        self.dir.path().join("config")
    }

    pub fn config_path(&self, name: &str) -> PathBuf {
        self.config_dir().join(format!("{}.json", name))
    }

    /// Failure reports land here unless `core.json` says otherwise
    pub fn log_dir(&self) -> PathBuf {
        self.dir.path().join("logs")
    }

    pub fn store(&self) -> ConfigStore {
        ConfigStore::new(self.config_dir())
    }

    /// Write a configuration artifact before the application is built
    pub fn seed(&self, name: &str, contents: &str) {
        std::fs::create_dir_all(self.config_dir()).unwrap();
        std::fs::write(self.config_path(name), contents).unwrap();
    }

    pub async fn build(&self) -> Result<Application, StartupError> {
        let console = self.console.clone();
        let root = self.dir.path().to_path_buf();
        Application::build(self.store(), self.transport.clone(), move |core| {
            DiagnosticSink::with_writer(console, root.join(&core.failure_log_dir), false)
        })
        .await
    }

    /// Build and start, panicking on failure
    pub async fn spawn(&self) -> Application {
        let mut app = self.build().await.expect("Failed to build application");
        app.start().await.expect("Failed to start application");
        tokio::time::timeout(Duration::from_secs(5), app.ready_hooks().wait())
            .await
            .expect("Ready hooks never fired");
        app
    }

    /// Wait until a console line contains `needle`
    pub async fn wait_for_console(&self, needle: &str) -> String {
        for _ in 0..200 {
            if let Some(line) = self.console.lines().into_iter().find(|l| l.contains(needle)) {
                return line;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("No console line contains {:?}:\n{}", needle, self.console.contents());
    }
}

/// File names in a directory, sorted
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}
