//! Unpunish Service
//!
//! Tracks time-bound punishments and runs the unpunisher loop that lifts them
//! once they expire. Outstanding punishments are persisted to
//! `punishments.json` so a restart picks up where the last process left off.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use validator::Validate;

use super::blacklist_service::BlacklistService;
use super::modlog_service::ModLogService;
use super::record_service::RecordService;
use crate::config::{ConfigStore, CoreConfig};
use crate::domain::{Punishment, PunishmentKind, PunishmentOrigin, RecordAction};
use crate::infrastructure::metrics;
use crate::infrastructure::transport::Transport;
use crate::shared::error::{ConfigError, ModerationError, RegistryError};
use crate::telemetry::{DiagnosticMessage, DiagnosticSink, FailureReport};

/// Artifact name of the punishment ledger
pub const LEDGER_NAME: &str = "punishments";

const LOG_SOURCE: &str = "Unpunish";

/// On-disk form of the outstanding punishments
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PunishmentLedger {
    pub punishments: Vec<Punishment>,
}

pub struct UnpunishService {
    transport: Arc<dyn Transport>,
    modlog: Arc<ModLogService>,
    records: Arc<RecordService>,
    sink: Arc<DiagnosticSink>,
    store: ConfigStore,
    interval: Duration,
    blacklist: OnceCell<Weak<BlacklistService>>,
    ledger: Mutex<Vec<Punishment>>,
}

impl UnpunishService {
    pub fn new(
        transport: Arc<dyn Transport>,
        modlog: Arc<ModLogService>,
        records: Arc<RecordService>,
        sink: Arc<DiagnosticSink>,
        store: ConfigStore,
        core: &CoreConfig,
    ) -> Self {
        Self {
            transport,
            modlog,
            records,
            sink,
            store,
            interval: Duration::from_secs(core.unpunish_interval_secs),
            blacklist: OnceCell::new(),
            ledger: Mutex::new(Vec::new()),
        }
    }

    /// Wire the blacklist in after it has been constructed with this service.
    pub fn attach_blacklist(&self, blacklist: &Arc<BlacklistService>) -> Result<(), RegistryError> {
        self.blacklist
            .set(Arc::downgrade(blacklist))
            .map_err(|_| RegistryError::Duplicate("BlacklistService"))
    }

    pub fn has_blacklist(&self) -> bool {
        self.blacklist
            .get()
            .and_then(Weak::upgrade)
            .is_some()
    }

    /// Load outstanding punishments, creating an empty ledger on first run.
    pub async fn get_records(&self) -> Result<usize, ConfigError> {
        let ledger: PunishmentLedger = self.store.load_existing_or_create(LEDGER_NAME).await?;
        let count = ledger.punishments.len();
        *self.ledger.lock().await = ledger.punishments;

        tracing::info!(count, "Outstanding punishments loaded");
        Ok(count)
    }

    /// Apply a punishment and track it until it expires.
    pub async fn add(&self, punishment: Punishment) -> Result<(), ModerationError> {
        self.transport.apply_punishment(&punishment).await?;

        let mut ledger = self.ledger.lock().await;
        ledger.push(punishment);
        self.persist(&ledger).await?;
        Ok(())
    }

    /// Punishments that have not been lifted yet
    pub async fn outstanding(&self) -> Vec<Punishment> {
        self.ledger.lock().await.clone()
    }

    /// Lift every punishment expired at `now`. Punishments the transport
    /// fails to lift stay in the ledger for the next pass.
    pub async fn lift_expired(&self, now: DateTime<Utc>) -> usize {
        let mut ledger = self.ledger.lock().await;
        let (expired, mut remaining): (Vec<_>, Vec<_>) =
            ledger.drain(..).partition(|p| p.is_expired(now));

        let mut lifted = 0;
        for punishment in expired {
            match self.transport.lift_punishment(&punishment).await {
                Ok(()) => {
                    self.after_lift(&punishment).await;
                    lifted += 1;
                }
                Err(e) => {
                    self.sink
                        .log(
                            DiagnosticMessage::error(
                                LOG_SOURCE,
                                format!("Failed to lift punishment {}", punishment.id),
                            )
                            .with_failure(FailureReport::from_error(&e)),
                        )
                        .await;
                    remaining.push(punishment);
                }
            }
        }
        *ledger = remaining;

        if lifted > 0 {
            if let Err(e) = self.persist(&ledger).await {
                self.sink
                    .log(
                        DiagnosticMessage::warning(LOG_SOURCE, "Failed to save punishment ledger")
                            .with_failure(FailureReport::from_error(&e)),
                    )
                    .await;
            }
        }
        lifted
    }

    /// Start the unpunisher loop. It runs one pass immediately, then one per
    /// interval, until `shutdown` flips to true or its sender is dropped.
    pub fn start(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(service.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(interval_secs = service.interval.as_secs(), "Unpunisher started");
            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let lifted = service.lift_expired(Utc::now()).await;
                        if lifted > 0 {
                            tracing::info!(lifted, "Expired punishments lifted");
                        }
                    }
                }
            }
            tracing::info!("Unpunisher stopped");
        })
    }

    async fn after_lift(&self, punishment: &Punishment) {
        metrics::record_punishment_lifted();

        let action = match punishment.kind {
            PunishmentKind::Mute => RecordAction::Unmute,
            PunishmentKind::Ban => RecordAction::Unban,
        };
        self.records.add(
            punishment.guild_id,
            punishment.user_id,
            None,
            action,
            "Punishment expired",
        );

        if punishment.origin == PunishmentOrigin::Blacklist {
            if let Some(blacklist) = self.blacklist.get().and_then(Weak::upgrade) {
                blacklist.reset_strikes(punishment.user_id);
            }
        }

        let text = format!(
            "Lifted {:?} for user {} (issued {})",
            punishment.kind,
            punishment.user_id,
            punishment.issued_at.format("%Y-%m-%d %H:%M UTC")
        );
        if let Err(e) = self.modlog.post(&text).await {
            self.sink
                .log(
                    DiagnosticMessage::warning(LOG_SOURCE, "Failed to post to the mod log")
                        .with_failure(FailureReport::from_error(&e)),
                )
                .await;
        }
        self.sink
            .log(DiagnosticMessage::verbose(LOG_SOURCE, text))
            .await;
    }

    async fn persist(&self, ledger: &[Punishment]) -> Result<(), ConfigError> {
        let snapshot = PunishmentLedger {
            punishments: ledger.to_vec(),
        };
        self.store.save(LEDGER_NAME, &snapshot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::configurable::Configurable;
    use crate::infrastructure::transport::MockTransport;
    use crate::shared::error::TransportError;
    use chrono::Duration as ChronoDuration;

    struct Fixture {
        _dir: tempfile::TempDir,
        store: ConfigStore,
        service: Arc<UnpunishService>,
        records: Arc<RecordService>,
    }

    async fn fixture(transport: MockTransport) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let transport: Arc<dyn Transport> = Arc::new(transport);
        let modlog = Arc::new(ModLogService::new(transport.clone(), store.clone()));
        modlog.load_configuration().await.unwrap();
        let records = Arc::new(RecordService::new());
        let sink = Arc::new(DiagnosticSink::with_writer(
            std::io::sink(),
            dir.path().join("logs"),
            false,
        ));
        let service = Arc::new(UnpunishService::new(
            transport,
            modlog,
            records.clone(),
            sink,
            store.clone(),
            &CoreConfig::default(),
        ));
        service.get_records().await.unwrap();

        Fixture {
            _dir: dir,
            store,
            service,
            records,
        }
    }

    fn mute(minutes: i64) -> Punishment {
        Punishment::new(
            1,
            500,
            PunishmentKind::Mute,
            PunishmentOrigin::Moderator,
            "spam",
            ChronoDuration::minutes(minutes),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_add_persists_ledger() {
        let mut transport = MockTransport::new();
        transport.expect_apply_punishment().times(1).returning(|_| Ok(()));
        let fx = fixture(transport).await;

        fx.service.add(mute(10)).await.unwrap();

        let ledger: PunishmentLedger = fx.store.load_existing(LEDGER_NAME).await.unwrap();
        assert_eq!(ledger.punishments.len(), 1);
        assert_eq!(fx.service.outstanding().await.len(), 1);
    }

    #[tokio::test]
    async fn test_lift_expired_only_lifts_expired() {
        let mut transport = MockTransport::new();
        transport.expect_apply_punishment().times(2).returning(|_| Ok(()));
        transport.expect_lift_punishment().times(1).returning(|_| Ok(()));
        let fx = fixture(transport).await;
        let short = mute(1);
        let long = mute(60);
        let short_expiry = short.expires_at;
        fx.service.add(short).await.unwrap();
        fx.service.add(long.clone()).await.unwrap();

        let lifted = fx.service.lift_expired(short_expiry).await;

        assert_eq!(lifted, 1);
        assert_eq!(fx.service.outstanding().await, vec![long]);
        let records = fx.records.records_for(500);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, RecordAction::Unmute);
    }

    #[tokio::test]
    async fn test_failed_lift_is_retried_later() {
        let mut transport = MockTransport::new();
        transport.expect_apply_punishment().returning(|_| Ok(()));
        transport
            .expect_lift_punishment()
            .times(1)
            .returning(|_| Err(TransportError::Action("member left".to_string())));
        let fx = fixture(transport).await;
        let punishment = mute(1);
        let expiry = punishment.expires_at;
        fx.service.add(punishment).await.unwrap();

        assert_eq!(fx.service.lift_expired(expiry).await, 0);
        assert_eq!(fx.service.outstanding().await.len(), 1);
    }

    #[tokio::test]
    async fn test_get_records_restores_ledger() {
        let mut transport = MockTransport::new();
        transport.expect_apply_punishment().returning(|_| Ok(()));
        let fx = fixture(transport).await;
        fx.service.add(mute(30)).await.unwrap();

        let restarted = UnpunishService::new(
            Arc::new(MockTransport::new()),
            Arc::new(ModLogService::new(Arc::new(MockTransport::new()), fx.store.clone())),
            Arc::new(RecordService::new()),
            Arc::new(DiagnosticSink::with_writer(std::io::sink(), "logs", false)),
            fx.store.clone(),
            &CoreConfig::default(),
        );

        assert_eq!(restarted.get_records().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_attach_blacklist_only_once() {
        let fx = fixture(MockTransport::new()).await;
        assert!(!fx.service.has_blacklist());

        let blacklist = Arc::new(BlacklistService::new(
            Arc::new(MockTransport::new()),
            fx.service.clone(),
            fx.records.clone(),
            Arc::new(ModLogService::new(Arc::new(MockTransport::new()), fx.store.clone())),
            fx.store.clone(),
            &CoreConfig::default(),
        ));

        fx.service.attach_blacklist(&blacklist).unwrap();
        assert!(fx.service.has_blacklist());
        assert_eq!(
            fx.service.attach_blacklist(&blacklist),
            Err(RegistryError::Duplicate("BlacklistService"))
        );
    }

    #[tokio::test]
    async fn test_loop_stops_on_shutdown() {
        let mut transport = MockTransport::new();
        transport.expect_lift_punishment().never();
        let fx = fixture(transport).await;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = fx.service.start(shutdown_rx);
        shutdown_tx.send(true).unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
