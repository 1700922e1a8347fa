//! CLI argument parsing and validation module
//!
//! Handles the command-line interface using clap, including:
//! - Session verbs (run, connect)
//! - Preference verbs (set-bridge, autostart)
//! - Inspection verbs (check-config, status, clear-logs)
//! - The global --config-dir override

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::config::BridgeMode;

/// Parsed invocation
#[derive(Debug, Clone)]
pub struct CliOptions {
    /// Preference/log directory override (default `~/.tortray`)
    pub config_dir: Option<PathBuf>,
    pub command: CliCommand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Long-running supervisor session
    Run { connect: bool },
    /// `run` with an immediate connect
    Connect,
    SetBridge(BridgeMode),
    Autostart(bool),
    CheckConfig,
    Status,
    ClearLogs,
}

/// Parse command line arguments and return the selected verb
pub fn parse_args() -> Result<CliOptions> {
    options_from(command().get_matches())
}

fn command() -> Command {
    Command::new("tortray")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Supervise a local Tor client with bridge support")
        .long_about(
            "Generates a torrc from saved preferences, launches and supervises the tor \
             process, captures its output into a session log, and polls connection health.",
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config-dir")
                .long("config-dir")
                .value_name("DIR")
                .global(true)
                .help("Preference and log directory (default: ~/.tortray)"),
        )
        .subcommand(
            Command::new("run")
                .about("Run a supervisor session until interrupted")
                .arg(
                    Arg::new("connect")
                        .long("connect")
                        .help("Connect immediately instead of waiting for run_on_launch")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("connect").about("Run a session and connect immediately"))
        .subcommand(
            Command::new("set-bridge")
                .about("Select the bridge mode used for the next connect")
                .arg(
                    Arg::new("mode")
                        .value_name("MODE")
                        .help("Bridge mode")
                        .required(true)
                        .value_parser(["none", "obfs4", "snowflake", "meek-azure"]),
                ),
        )
        .subcommand(
            Command::new("autostart")
                .about("Connect automatically when a session starts")
                .arg(
                    Arg::new("state")
                        .value_name("STATE")
                        .help("on or off")
                        .required(true)
                        .value_parser(["on", "off"]),
                ),
        )
        .subcommand(
            Command::new("check-config")
                .about("Validate preferences and print the torrc that would be used"),
        )
        .subcommand(Command::new("status").about("Show preferences and probe the SOCKS port"))
        .subcommand(Command::new("clear-logs").about("Truncate the session log"))
}

fn options_from(matches: ArgMatches) -> Result<CliOptions> {
    let config_dir = matches.get_one::<String>("config-dir").map(PathBuf::from);

    let command = match matches.subcommand() {
        Some(("run", sub)) => CliCommand::Run {
            connect: sub.get_flag("connect"),
        },
        Some(("connect", _)) => CliCommand::Connect,
        Some(("set-bridge", sub)) => {
            let mode = sub
                .get_one::<String>("mode")
                .context("bridge mode is required")?
                .parse::<BridgeMode>()?;
            CliCommand::SetBridge(mode)
        }
        Some(("autostart", sub)) => {
            let state = sub
                .get_one::<String>("state")
                .context("autostart state is required")?;
            CliCommand::Autostart(state == "on")
        }
        Some(("check-config", _)) => CliCommand::CheckConfig,
        Some(("status", _)) => CliCommand::Status,
        Some(("clear-logs", _)) => CliCommand::ClearLogs,
        _ => bail!("a subcommand is required"),
    };

    Ok(CliOptions {
        config_dir,
        command,
    })
}
