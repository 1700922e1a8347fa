//! Global constants for tortray
//!
//! Centralized location for application-wide constants

use std::time::Duration;

/// Directory under the user's home that holds the config file and session log
pub const CONFIG_DIR_NAME: &str = ".tortray";

/// Preferences file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Session log file name inside the config directory
pub const LOG_FILE_NAME: &str = "tor.log";

/// Tor binary to launch when no explicit path is configured (resolved via PATH)
pub const DEFAULT_TOR_PATH: &str = "tor";

/// Default local SOCKS5 listener port
pub const DEFAULT_SOCKS_PORT: u16 = 9050;

/// Default control listener port
pub const DEFAULT_CONTROL_PORT: u16 = 9051;

/// How long a terminated tor child gets to exit before SIGKILL
pub const STOP_GRACE: Duration = Duration::from_secs(5);

/// Upper bound on waiting for the output drain task to finish after teardown
pub const DRAIN_SETTLE: Duration = Duration::from_secs(1);

/// Health monitor tick interval
pub const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Connect timeout for the SOCKS port reachability probe
pub const PORT_PROBE_TIMEOUT: Duration = Duration::from_millis(300);

/// Pluggable-transport binary names, used both as `pt_paths` keys and as the
/// last-resort executable name when no configured candidate exists on disk
pub const OBFS4_CLIENT: &str = "obfs4proxy";
pub const SNOWFLAKE_CLIENT: &str = "snowflake-client";
pub const MEEK_CLIENT: &str = "meek-client";

/// Default search lists for the transport clients (colon-separated, first
/// existing path wins). Homebrew installs land in one of these on macOS.
pub const DEFAULT_OBFS4_PATHS: &str = "/opt/homebrew/bin/obfs4proxy:/usr/local/bin/obfs4proxy";
pub const DEFAULT_SNOWFLAKE_PATHS: &str =
    "/opt/homebrew/bin/snowflake-client:/usr/local/bin/snowflake-client";
pub const DEFAULT_MEEK_PATHS: &str = "/opt/homebrew/bin/meek-client:/usr/local/bin/meek-client";

/// Built-in snowflake bridge line (broker behind CDN fronts, NAT traversal
/// over the listed STUN servers)
pub const SNOWFLAKE_BRIDGE: &str = "snowflake 192.0.2.4:80 8838024498816A039FCBBAB14E6F40A0843051FA fingerprint=8838024498816A039FCBBAB14E6F40A0843051FA url=https://1098762253.rsc.cdn77.org/ fronts=www.cdn77.com,www.phpmyadmin.net ice=stun:stun.l.google.com:19302,stun:stun.altar.com.pl:3478,stun:stun.antisip.com:3478,stun:stun.bluesip.net:3478,stun:stun.dus.net:3478,stun:stun.epygi.com:3478,stun:stun.sonetel.com:3478,stun:stun.uls.co.za:3478,stun:stun.voipgate.com:3478,stun:stun.voys.nl:3478 utls-imitate=hellorandomizedalpn";

/// Built-in meek bridge line (Azure CDN domain front)
pub const MEEK_BRIDGE: &str = "meek_lite 192.0.2.18:80 BE776A53492E1E044A26F17306E1BC46A55A1625 url=https://meek.azureedge.net/ front=ajax.aspnetcdn.com";

/// Session banner delimiter written around the startup header in the log
pub const SESSION_DELIMITER: &str =
    "============================================================";

/// Terminal record the drain task appends once both output streams close
pub const PROCESS_EXITED_MARKER: &str = "(Tor process exited)";
