//! Connection health polling
//!
//! Every couple of seconds: is the child alive, and does the SOCKS port
//! answer? Liveness comes first and only a live process gets its port
//! probed, so a stopped tor never produces a half-connected snapshot.
//! Snapshots go out over a watch channel; receivers see the latest value
//! and a notification whenever it changes.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::constants;
use crate::supervisor::TorSupervisor;

/// Point-in-time connection health
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Child process is alive per the OS
    pub process_alive: bool,
    /// SOCKS port accepted a TCP connection
    pub port_reachable: bool,
}

impl StatusSnapshot {
    /// Connected means both: the daemon runs and its listener answers
    pub fn is_connected(&self) -> bool {
        self.process_alive && self.port_reachable
    }
}

pub struct HealthMonitor;

impl HealthMonitor {
    /// Spawn the polling loop. The receiver starts from the disconnected
    /// default and is notified whenever the snapshot changes.
    pub fn spawn(
        supervisor: Arc<TorSupervisor>,
        socks_port: u16,
    ) -> (HealthMonitorHandle, watch::Receiver<StatusSnapshot>) {
        let (tx, rx) = watch::channel(StatusSnapshot::default());
        let task = tokio::spawn(async move {
            let mut tick = interval(constants::HEALTH_POLL_INTERVAL);
            // Late ticks just slide; no catch-up bursts
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last = StatusSnapshot::default();
            loop {
                tick.tick().await;
                let snapshot = Self::check_once(&supervisor, socks_port).await;
                if snapshot != last {
                    tracing::debug!(
                        alive = snapshot.process_alive,
                        reachable = snapshot.port_reachable,
                        "health changed"
                    );
                    last = snapshot;
                    if tx.send(snapshot).is_err() {
                        break;
                    }
                }
            }
        });
        (
            HealthMonitorHandle {
                abort: task.abort_handle(),
            },
            rx,
        )
    }

    /// One health pass, outside the polling loop
    pub async fn check_once(supervisor: &TorSupervisor, socks_port: u16) -> StatusSnapshot {
        let process_alive = supervisor.is_alive().await;
        let port_reachable = process_alive && probe_socks_port(socks_port).await;
        StatusSnapshot {
            process_alive,
            port_reachable,
        }
    }
}

/// Bounded TCP connect probe against the local SOCKS listener
pub async fn probe_socks_port(port: u16) -> bool {
    let attempt = tokio::net::TcpStream::connect(("127.0.0.1", port));
    matches!(timeout(constants::PORT_PROBE_TIMEOUT, attempt).await, Ok(Ok(_)))
}

/// Stops the polling task when dropped
pub struct HealthMonitorHandle {
    abort: AbortHandle,
}

impl HealthMonitorHandle {
    pub fn stop(&self) {
        self.abort.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

impl Drop for HealthMonitorHandle {
    fn drop(&mut self) {
        self.abort.abort();
    }
}
