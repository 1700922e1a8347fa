#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::Result;

use tortray::cli::{self, CliCommand};
use tortray::config::{BridgeMode, ConfigStore};
use tortray::control::{self, TrayController};
use tortray::logsink::LogSink;
use tortray::monitor;
use tortray::supervisor::TorSupervisor;
use tortray::torrc;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let opts = cli::parse_args()?;

    let base = match opts.config_dir {
        Some(dir) => dir,
        None => ConfigStore::default_base()?,
    };
    let store = ConfigStore::new(base);

    match opts.command {
        CliCommand::Run { connect } => control::run_session(store, connect).await,
        CliCommand::Connect => control::run_session(store, true).await,
        CliCommand::SetBridge(mode) => cmd_set_bridge(store, mode),
        CliCommand::Autostart(enabled) => cmd_autostart(store, enabled),
        CliCommand::CheckConfig => cmd_check_config(store),
        CliCommand::Status => cmd_status(store).await,
        CliCommand::ClearLogs => cmd_clear_logs(store),
    }
}

fn init_tracing() {
    // Diagnostics go to stderr; stdout stays clean for command output
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Controller for one-shot verbs: opens the log sink without writing a
/// session banner and never spawns the monitor
fn one_shot_controller(store: &ConfigStore) -> Result<TrayController> {
    let sink = Arc::new(LogSink::open(&store.log_path())?);
    let supervisor = Arc::new(TorSupervisor::new(Arc::clone(&sink)));
    TrayController::new(store.clone(), supervisor, sink)
}

fn cmd_set_bridge(store: ConfigStore, mode: BridgeMode) -> Result<()> {
    let mut controller = one_shot_controller(&store)?;
    controller.set_bridge_mode(mode)?;
    println!("bridge mode set to {mode}");
    Ok(())
}

fn cmd_autostart(store: ConfigStore, enabled: bool) -> Result<()> {
    let mut controller = one_shot_controller(&store)?;
    controller.set_run_on_launch(enabled)?;
    println!("autostart {}", if enabled { "enabled" } else { "disabled" });
    Ok(())
}

fn cmd_check_config(store: ConfigStore) -> Result<()> {
    let cfg = store.load()?;
    let directives = torrc::resolve(&cfg)?;
    print!("{}", torrc::render(&directives));
    Ok(())
}

async fn cmd_status(store: ConfigStore) -> Result<()> {
    let cfg = store.load()?;
    let reachable = monitor::probe_socks_port(cfg.socks_port).await;
    println!("bridge mode:   {}", cfg.bridge);
    println!("tor binary:    {}", cfg.tor_path);
    println!(
        "socks port:    {} ({})",
        cfg.socks_port,
        if reachable { "reachable" } else { "unreachable" }
    );
    println!("control port:  {}", cfg.control_port);
    println!(
        "run on launch: {}",
        if cfg.run_on_launch { "on" } else { "off" }
    );
    println!("log file:      {}", store.log_path().display());
    Ok(())
}

fn cmd_clear_logs(store: ConfigStore) -> Result<()> {
    let sink = LogSink::open(&store.log_path())?;
    sink.clear()?;
    println!("cleared {}", sink.path().display());
    Ok(())
}
