//! Application Startup
//!
//! Builds every subsystem in dependency order, publishes them through the
//! service registry, connects the transport and starts the unpunisher.
//!
//! The sequence is split in three phases:
//! - [`Application::build`]: configuration, construction, registry, commands
//!   and the transport event pump
//! - [`Application::start`]: transport login/start, then the unpunisher loop
//! - [`Application::run_until_stopped`]: park until shutdown, then stop the
//!   background tasks

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::application::services::{
    AliasTrackingService, BlacklistService, ModLogService, ModerationService, PermissionsService,
    RatelimitService, RecordService, SlowmodeService, TagService, UnpunishService,
    UsernoteService,
};
use crate::application::{Configurable, ServiceRegistry, ServiceRegistryBuilder};
use crate::config::{ConfigStore, CoreConfig};
use crate::infrastructure::metrics;
use crate::infrastructure::transport::{Transport, TransportEvent};
use crate::presentation::commands::{CommandDispatcher, COMMANDS};
use crate::shared::error::{StartupError, TransportError};
use crate::telemetry::{DiagnosticMessage, DiagnosticSink, FailureReport};

const LOG_SOURCE: &str = "Startup";

/// Registry name of the transport handle
pub const TRANSPORT_SERVICE: &str = "Transport";

type ReadyHook = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), StartupError>> + Send>;

/// Hooks deferred until the transport reports it is ready.
///
/// Hooks are consumed when fired, so each one runs at most once no matter
/// how many `Ready` events arrive.
pub struct ReadyHooks {
    pending: Mutex<Vec<(&'static str, ReadyHook)>>,
    runs: AtomicUsize,
    fired: watch::Sender<bool>,
}

impl ReadyHooks {
    pub fn new() -> Self {
        let (fired, _) = watch::channel(false);
        Self {
            pending: Mutex::new(Vec::new()),
            runs: AtomicUsize::new(0),
            fired,
        }
    }

    pub fn register<F, Fut>(&self, name: &'static str, hook: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), StartupError>> + Send + 'static,
    {
        let hook: ReadyHook = Box::new(move || hook().boxed());
        self.pending.lock().push((name, hook));
    }

    /// Run every pending hook, in registration order.
    pub async fn fire(&self) -> Vec<(&'static str, Result<(), StartupError>)> {
        let hooks = std::mem::take(&mut *self.pending.lock());

        let mut outcomes = Vec::with_capacity(hooks.len());
        for (name, hook) in hooks {
            self.runs.fetch_add(1, Ordering::SeqCst);
            outcomes.push((name, hook().await));
        }
        self.fired.send_replace(true);
        outcomes
    }

    /// Number of hook executions so far
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn has_fired(&self) -> bool {
        *self.fired.borrow()
    }

    /// Wait until the hooks have been fired once.
    pub async fn wait(&self) {
        let mut fired = self.fired.subscribe();
        // The sender lives in self, so this cannot fail
        let _ = fired.wait_for(|fired| *fired).await;
    }
}

impl Default for ReadyHooks {
    fn default() -> Self {
        Self::new()
    }
}

/// Application instance
pub struct Application {
    core: Arc<CoreConfig>,
    transport: Arc<dyn Transport>,
    sink: Arc<DiagnosticSink>,
    registry: Arc<ServiceRegistry>,
    dispatcher: Arc<CommandDispatcher>,
    ready_hooks: Arc<ReadyHooks>,
    shutdown: watch::Sender<bool>,
    event_pump: Option<JoinHandle<()>>,
    unpunisher: Option<JoinHandle<()>>,
}

impl Application {
    /// Load configuration, construct the subsystems and wire them together.
    ///
    /// `sink_for` builds the diagnostic sink once the core configuration
    /// (and with it the failure-report directory) is known.
    ///
    /// # Errors
    ///
    /// Any configuration or registry failure aborts the build.
    pub async fn build<F>(
        store: ConfigStore,
        transport: Arc<dyn Transport>,
        sink_for: F,
    ) -> Result<Self, StartupError>
    where
        F: FnOnce(&CoreConfig) -> DiagnosticSink,
    {
        store.ensure_exists().await?;
        let core = Arc::new(CoreConfig::load_existing_or_create(&store).await?);
        let sink = Arc::new(sink_for(core.as_ref()));
        tracing::info!(dir = %store.root().display(), "Core configuration loaded");
        step(&sink, "Core configuration loaded").await;

        let moderation = Arc::new(ModerationService::new(store.clone()));
        moderation.load_configuration().await?;

        let usernotes = Arc::new(UsernoteService::new());
        let records = Arc::new(RecordService::new());
        let tags = Arc::new(TagService::new());

        let modlog = Arc::new(ModLogService::new(transport.clone(), store.clone()));
        modlog.load_configuration().await?;

        let unpunish = Arc::new(UnpunishService::new(
            transport.clone(),
            modlog.clone(),
            records.clone(),
            sink.clone(),
            store.clone(),
            &core,
        ));
        let outstanding = unpunish.get_records().await?;

        let slowmode = Arc::new(SlowmodeService::new(
            transport.clone(),
            modlog.clone(),
            unpunish.clone(),
            records.clone(),
            &core,
        ));

        let ratelimit = Arc::new(RatelimitService::new(
            transport.clone(),
            &core,
            records.clone(),
            unpunish.clone(),
            modlog.clone(),
            store.clone(),
        ));
        let ratelimit_config = ratelimit.load_configuration().await?;
        if ratelimit_config.is_enabled {
            ratelimit.enable(ratelimit_config.limit);
        }

        let blacklist = Arc::new(BlacklistService::new(
            transport.clone(),
            unpunish.clone(),
            records.clone(),
            modlog.clone(),
            store.clone(),
            &core,
        ));
        unpunish.attach_blacklist(&blacklist)?;

        let aliases = Arc::new(AliasTrackingService::new(transport.clone(), store.clone()));
        aliases.load_configuration().await?;

        let permissions = Arc::new(PermissionsService::new(store.clone()));
        permissions.load_permissions(COMMANDS.iter().map(|c| c.permission));
        permissions.load_configuration().await?;

        step(
            &sink,
            format!("Subsystems constructed ({} outstanding punishments)", outstanding),
        )
        .await;

        let mut builder = ServiceRegistryBuilder::new();
        builder
            .register(moderation)?
            .register(usernotes)?
            .register(records)?
            .register(tags)?
            .register(modlog)?
            .register(unpunish)?
            .register(slowmode)?
            .register(ratelimit)?
            .register(blacklist.clone())?
            .register(aliases)?
            .register(permissions)?
            .register_as(TRANSPORT_SERVICE, Arc::new(transport.clone()))?
            .register(core.clone())?;
        let registry = Arc::new(builder.build());
        tracing::info!(services = registry.len(), "Service registry populated");

        let dispatcher = Arc::new(CommandDispatcher::new(registry.clone()));
        let commands = dispatcher.install()?;
        step(&sink, format!("{} commands installed", commands)).await;

        let ready_hooks = Arc::new(ReadyHooks::new());
        ready_hooks.register("blacklist", move || async move {
            blacklist
                .initialize()
                .await
                .map(|_| ())
                .map_err(StartupError::DeferredHook)
        });

        let (shutdown, _) = watch::channel(false);
        let event_pump = spawn_event_pump(
            transport.subscribe(),
            ready_hooks.clone(),
            sink.clone(),
            shutdown.subscribe(),
        );

        Ok(Self {
            core,
            transport,
            sink,
            registry,
            dispatcher,
            ready_hooks,
            shutdown,
            event_pump: Some(event_pump),
            unpunisher: None,
        })
    }

    /// Connect the transport and start the unpunisher loop.
    ///
    /// # Errors
    ///
    /// `StartupError::ConnectFailure` when the transport cannot log in or
    /// start, or when the application was already started.
    pub async fn start(&mut self) -> Result<(), StartupError> {
        if self.unpunisher.is_some() {
            return Err(TransportError::AlreadyStarted.into());
        }

        self.transport.login(&self.core.token).await?;
        self.transport.start().await?;
        step(&self.sink, "Transport connected").await;

        let unpunish = self.registry.require::<UnpunishService>()?;
        self.unpunisher = Some(unpunish.start(self.shutdown.subscribe()));
        step(&self.sink, "Unpunisher started").await;
        Ok(())
    }

    /// Park until `shutdown` completes, then stop the background tasks.
    pub async fn run_until_stopped<S>(self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        shutdown.await;
        step(&self.sink, "Shutting down").await;
        self.stop().await;
    }

    /// Signal the background tasks and wait for them to finish.
    pub async fn stop(mut self) {
        self.shutdown.send_replace(true);
        for task in [self.event_pump.take(), self.unpunisher.take()]
            .into_iter()
            .flatten()
        {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Background task panicked");
            }
        }
        tracing::debug!(metrics = %metrics::gather_metrics(), "Final metrics");
        tracing::info!("Application stopped");
    }

    pub fn core(&self) -> &CoreConfig {
        &self.core
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Arc<CommandDispatcher> {
        &self.dispatcher
    }

    pub fn ready_hooks(&self) -> &Arc<ReadyHooks> {
        &self.ready_hooks
    }

    pub fn sink(&self) -> &Arc<DiagnosticSink> {
        &self.sink
    }

    pub fn is_started(&self) -> bool {
        self.unpunisher.is_some()
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("services", &self.registry.names())
            .field("started", &self.is_started())
            .finish_non_exhaustive()
    }
}

async fn step(sink: &DiagnosticSink, text: impl Into<String>) {
    let text = text.into();
    tracing::debug!(step = %text, "Startup step");
    sink.log(DiagnosticMessage::info(LOG_SOURCE, text)).await;
}

/// Forward transport events: `Ready` fires the deferred hooks, `Log` goes to
/// the sink.
fn spawn_event_pump(
    mut events: broadcast::Receiver<TransportEvent>,
    hooks: Arc<ReadyHooks>,
    sink: Arc<DiagnosticSink>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                event = events.recv() => match event {
                    Ok(TransportEvent::Ready) => run_ready_hooks(&hooks, &sink).await,
                    Ok(TransportEvent::Log(message)) => sink.log(message).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Transport events dropped");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        tracing::debug!("Event pump stopped");
    })
}

async fn run_ready_hooks(hooks: &ReadyHooks, sink: &DiagnosticSink) {
    for (name, outcome) in hooks.fire().await {
        match outcome {
            Ok(()) => {
                tracing::info!(hook = name, "Ready hook completed");
                sink.log(DiagnosticMessage::verbose(
                    LOG_SOURCE,
                    format!("Ready hook {} completed", name),
                ))
                .await;
            }
            Err(e) => {
                tracing::error!(hook = name, error = %e, "Ready hook failed");
                sink.log(
                    DiagnosticMessage::error(LOG_SOURCE, format!("Ready hook {} failed", name))
                        .with_failure(FailureReport::categorized(e.kind(), &e)),
                )
                .await;
            }
        }
    }
}
