//! Menu-level operations
//!
//! `TrayController` is the one place user intent arrives: connect and
//! disconnect, bridge selection, the autostart preference, status readout.
//! Every path through here leaves a record in the session log and persists
//! whatever it changed, so the menu verbs stay thin.

use std::io;
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};

use crate::config::{BridgeMode, ConfigStore, TrayConfig};
use crate::logsink::LogSink;
use crate::monitor::{HealthMonitor, StatusSnapshot};
use crate::supervisor::{LaunchError, TorSupervisor};
use crate::torrc::{self, ConfigError};

/// What a toggle ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Connected,
    Disconnected,
}

/// Everything `connect` can fail with, by stage
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to write torrc: {0}")]
    Render(#[source] io::Error),
    #[error(transparent)]
    Launch(#[from] LaunchError),
}

impl ControlError {
    /// Stable category for callers that present errors rather than match
    /// on them
    pub fn kind(&self) -> &'static str {
        match self {
            ControlError::Config(_) => "config",
            ControlError::Render(_) => "render",
            ControlError::Launch(_) => "launch",
        }
    }
}

/// Owns the live pieces of a session: preferences, supervisor, log sink
pub struct TrayController {
    store: ConfigStore,
    cfg: TrayConfig,
    supervisor: Arc<TorSupervisor>,
    sink: Arc<LogSink>,
}

impl TrayController {
    /// Load preferences and wire the controller up. The store auto-creates
    /// a default config on first use.
    pub fn new(
        store: ConfigStore,
        supervisor: Arc<TorSupervisor>,
        sink: Arc<LogSink>,
    ) -> anyhow::Result<Self> {
        let cfg = store.load()?;
        Ok(TrayController {
            store,
            cfg,
            supervisor,
            sink,
        })
    }

    pub fn config(&self) -> &TrayConfig {
        &self.cfg
    }

    pub fn supervisor(&self) -> &Arc<TorSupervisor> {
        &self.supervisor
    }

    /// Generate a torrc for the current preferences and launch tor with it
    pub async fn connect(&mut self) -> Result<(), ControlError> {
        let directives = match torrc::resolve(&self.cfg) {
            Ok(directives) => directives,
            Err(err) => {
                self.log(&format!("Config error: {err}"));
                return Err(err.into());
            }
        };
        let rendered = match torrc::render_to_temp(&directives) {
            Ok(rendered) => rendered,
            Err(err) => {
                self.log(&format!("ERROR: failed to write torrc: {err}"));
                return Err(ControlError::Render(err));
            }
        };

        self.log(&format!("Starting Tor with bridge: {}", self.cfg.bridge));
        self.log(&format!("Torrc file: {}", rendered.path.display()));

        if let Err(err) = self.supervisor.start(&self.cfg.tor_path, &rendered.path).await {
            // The supervisor never took ownership of the file
            let _ = std::fs::remove_file(&rendered.path);
            match &err {
                LaunchError::ExecutableNotFound { .. } => {
                    self.log("ERROR: Tor binary not found. Install with: brew install tor");
                }
                other => self.log(&format!("ERROR: {other}")),
            }
            return Err(err.into());
        }
        Ok(())
    }

    /// Tear the child down if any; always lands idle
    pub async fn disconnect(&mut self) {
        self.supervisor.stop().await;
    }

    /// Connect when nothing is running, disconnect when something is
    pub async fn toggle_connect(&mut self) -> Result<ToggleOutcome, ControlError> {
        if self.supervisor.is_alive().await {
            self.disconnect().await;
            Ok(ToggleOutcome::Disconnected)
        } else {
            self.connect().await?;
            Ok(ToggleOutcome::Connected)
        }
    }

    /// Select a bridge mode and persist it
    pub fn set_bridge_mode(&mut self, mode: BridgeMode) -> anyhow::Result<()> {
        self.cfg.bridge = mode;
        self.store.save(&self.cfg)?;
        self.log(&format!("Bridge mode set to: {mode}"));
        Ok(())
    }

    /// Persist the connect-on-launch preference
    pub fn set_run_on_launch(&mut self, enabled: bool) -> anyhow::Result<()> {
        self.cfg.run_on_launch = enabled;
        self.store.save(&self.cfg)?;
        Ok(())
    }

    /// Health snapshot for the supervised child
    pub async fn connection_status(&self) -> StatusSnapshot {
        HealthMonitor::check_once(&self.supervisor, self.cfg.socks_port).await
    }

    fn log(&self, line: &str) {
        if let Err(err) = self.sink.append(line) {
            tracing::warn!(%err, "log append failed");
        }
    }
}

/// Drive a live session: connect up front when asked to (or when
/// `run_on_launch` says so), then sit on the status watch until Ctrl-C.
pub async fn run_session(store: ConfigStore, connect_now: bool) -> anyhow::Result<()> {
    // Register before announcing readiness so an early Ctrl-C is latched
    // rather than killing the process
    let mut interrupt = signal(SignalKind::interrupt())?;
    let sink = Arc::new(LogSink::open(&store.log_path())?);
    sink.init_session()?;
    let supervisor = Arc::new(TorSupervisor::new(Arc::clone(&sink)));
    let mut controller = TrayController::new(store, Arc::clone(&supervisor), Arc::clone(&sink))?;
    let socks_port = controller.config().socks_port;
    let (monitor, mut status_rx) = HealthMonitor::spawn(Arc::clone(&supervisor), socks_port);

    if connect_now || controller.config().run_on_launch {
        if let Err(err) = controller.connect().await {
            eprintln!("tortray: {err}");
        }
    }
    println!("tortray: session ready (socks5 127.0.0.1:{socks_port}), Ctrl-C to exit");

    loop {
        tokio::select! {
            _ = interrupt.recv() => break,
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = *status_rx.borrow_and_update();
                if snapshot.is_connected() {
                    println!("tortray: connected (socks5 127.0.0.1:{socks_port})");
                } else if snapshot.process_alive {
                    println!("tortray: tor is running, socks port not answering yet");
                } else {
                    println!("tortray: disconnected");
                }
            }
        }
    }

    tracing::info!("shutting down");
    controller.disconnect().await;
    if let Err(err) = sink.append("TorTray shutting down") {
        tracing::warn!(%err, "log append failed");
    }
    monitor.stop();
    Ok(())
}
