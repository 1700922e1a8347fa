//! Preference resolution into torrc directives
//!
//! Pure functions: same preferences in, same directive list out. Anything
//! touching the filesystem is limited to checking whether transport client
//! binaries exist.

use std::path::PathBuf;

use crate::config::{BridgeMode, TrayConfig};
use crate::constants;

use super::ConfigError;

/// Ordered torrc directive lines, one directive per entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrcDirectives {
    lines: Vec<String>,
}

impl TorrcDirectives {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// Build the directive list for the given preferences.
///
/// The baseline block always comes first and in a fixed order: listener
/// ports, cookie auth, stdout logging, client-only flag. The bridge block
/// for the selected mode follows (`UseBridges`, the transport plugin line,
/// then one `Bridge` per line).
pub fn resolve(cfg: &TrayConfig) -> Result<TorrcDirectives, ConfigError> {
    validate_ports(cfg)?;

    let mut lines = vec![
        format!("SOCKSPort {}", cfg.socks_port),
        format!("ControlPort {}", cfg.control_port),
        "CookieAuthentication 1".to_string(),
        "Log notice stdout".to_string(),
        "ClientOnly 1".to_string(),
    ];

    match cfg.bridge {
        BridgeMode::None => {}
        BridgeMode::Obfs4 => {
            let bridges = usable_bridge_lines(&cfg.obfs4_bridges);
            if bridges.is_empty() {
                return Err(ConfigError::NoBridges);
            }
            lines.push("UseBridges 1".to_string());
            let exec = transport_exec(cfg, constants::OBFS4_CLIENT);
            lines.push(format!("ClientTransportPlugin obfs4 exec {exec}"));
            for bridge in bridges {
                lines.push(format!("Bridge {bridge}"));
            }
        }
        BridgeMode::Snowflake => {
            lines.push("UseBridges 1".to_string());
            let exec = transport_exec(cfg, constants::SNOWFLAKE_CLIENT);
            // The snowflake client is chatty; its own log goes nowhere
            lines.push(format!(
                "ClientTransportPlugin snowflake exec {exec} -log /dev/null"
            ));
            lines.push(format!("Bridge {}", constants::SNOWFLAKE_BRIDGE));
        }
        BridgeMode::MeekAzure => {
            lines.push("UseBridges 1".to_string());
            let exec = transport_exec(cfg, constants::MEEK_CLIENT);
            lines.push(format!("ClientTransportPlugin meek_lite exec {exec}"));
            lines.push(format!("Bridge {}", constants::MEEK_BRIDGE));
        }
    }

    Ok(TorrcDirectives { lines })
}

fn validate_ports(cfg: &TrayConfig) -> Result<(), ConfigError> {
    if cfg.socks_port == 0 {
        return Err(ConfigError::InvalidPort { role: "socks" });
    }
    if cfg.control_port == 0 {
        return Err(ConfigError::InvalidPort { role: "control" });
    }
    if cfg.socks_port == cfg.control_port {
        return Err(ConfigError::PortClash(cfg.socks_port));
    }
    Ok(())
}

/// Executable to put on a `ClientTransportPlugin` line: the first candidate
/// from the configured search list that exists on disk, else the bare binary
/// name so PATH lookup gets a chance.
fn transport_exec(cfg: &TrayConfig, client: &str) -> String {
    cfg.pt_paths
        .get(client)
        .and_then(|list| first_existing_path(list))
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| client.to_string())
}

/// First entry of a colon-separated path list that exists on disk
fn first_existing_path(list: &str) -> Option<PathBuf> {
    list.split(':')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .find(|path| path.exists())
}

/// Bridge lines worth emitting. Blank and `#` comment entries are judged on
/// their trimmed form, but kept entries pass through verbatim.
fn usable_bridge_lines(lines: &[String]) -> Vec<&str> {
    lines
        .iter()
        .map(String::as_str)
        .filter(|line| {
            let t = line.trim();
            !t.is_empty() && !t.starts_with('#')
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cfg_with_bridge(bridge: BridgeMode) -> TrayConfig {
        TrayConfig {
            bridge,
            ..TrayConfig::default()
        }
    }

    #[test]
    fn test_baseline_block_order_is_fixed() {
        let directives = resolve(&cfg_with_bridge(BridgeMode::None)).unwrap();
        assert_eq!(
            directives.lines(),
            &[
                "SOCKSPort 9050",
                "ControlPort 9051",
                "CookieAuthentication 1",
                "Log notice stdout",
                "ClientOnly 1",
            ]
        );
    }

    #[test]
    fn test_none_mode_has_no_bridge_block() {
        let directives = resolve(&cfg_with_bridge(BridgeMode::None)).unwrap();
        assert!(directives.lines().iter().all(|l| !l.starts_with("UseBridges")));
        assert!(directives.lines().iter().all(|l| !l.starts_with("Bridge ")));
    }

    #[test]
    fn test_snowflake_block_follows_baseline() {
        let directives = resolve(&cfg_with_bridge(BridgeMode::Snowflake)).unwrap();
        let lines = directives.lines();
        assert_eq!(lines[5], "UseBridges 1");
        assert!(lines[6].starts_with("ClientTransportPlugin snowflake exec "));
        assert!(lines[6].ends_with(" -log /dev/null"));
        // Spelled out rather than derived from the constant so a drifting
        // descriptor fails here
        assert_eq!(
            lines[7],
            "Bridge snowflake 192.0.2.4:80 8838024498816A039FCBBAB14E6F40A0843051FA fingerprint=8838024498816A039FCBBAB14E6F40A0843051FA url=https://1098762253.rsc.cdn77.org/ fronts=www.cdn77.com,www.phpmyadmin.net ice=stun:stun.l.google.com:19302,stun:stun.altar.com.pl:3478,stun:stun.antisip.com:3478,stun:stun.bluesip.net:3478,stun:stun.dus.net:3478,stun:stun.epygi.com:3478,stun:stun.sonetel.com:3478,stun:stun.uls.co.za:3478,stun:stun.voipgate.com:3478,stun:stun.voys.nl:3478 utls-imitate=hellorandomizedalpn"
        );
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn test_meek_azure_uses_meek_lite_transport() {
        let directives = resolve(&cfg_with_bridge(BridgeMode::MeekAzure)).unwrap();
        let lines = directives.lines();
        assert_eq!(lines[5], "UseBridges 1");
        assert!(lines[6].starts_with("ClientTransportPlugin meek_lite exec "));
        assert_eq!(
            lines[7],
            "Bridge meek_lite 192.0.2.18:80 BE776A53492E1E044A26F17306E1BC46A55A1625 url=https://meek.azureedge.net/ front=ajax.aspnetcdn.com"
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let cfg = cfg_with_bridge(BridgeMode::Snowflake);
        assert_eq!(resolve(&cfg).unwrap(), resolve(&cfg).unwrap());
    }

    #[test]
    fn test_obfs4_without_usable_bridges_is_rejected() {
        // The shipped default only carries instructional comments
        let err = resolve(&cfg_with_bridge(BridgeMode::Obfs4)).unwrap_err();
        assert!(matches!(err, ConfigError::NoBridges));
        assert!(err.to_string().contains("no bridges configured"));
    }

    #[test]
    fn test_obfs4_filters_comments_and_blanks_keeps_order() {
        let mut cfg = cfg_with_bridge(BridgeMode::Obfs4);
        cfg.obfs4_bridges = vec![
            "# a comment".to_string(),
            "".to_string(),
            "obfs4 1.2.3.4:1234 AAAA cert=x iat-mode=0".to_string(),
            "   ".to_string(),
            "  obfs4 5.6.7.8:443 BBBB cert=y iat-mode=0  ".to_string(),
        ];
        let directives = resolve(&cfg).unwrap();
        let bridges: Vec<&String> = directives
            .lines()
            .iter()
            .filter(|l| l.starts_with("Bridge "))
            .collect();
        // Kept entries go out exactly as configured, surrounding whitespace
        // included
        assert_eq!(
            bridges,
            vec![
                "Bridge obfs4 1.2.3.4:1234 AAAA cert=x iat-mode=0",
                "Bridge   obfs4 5.6.7.8:443 BBBB cert=y iat-mode=0  ",
            ]
        );
    }

    #[test]
    fn test_custom_ports_flow_through() {
        let mut cfg = cfg_with_bridge(BridgeMode::None);
        cfg.socks_port = 19050;
        cfg.control_port = 19051;
        let directives = resolve(&cfg).unwrap();
        assert_eq!(directives.lines()[0], "SOCKSPort 19050");
        assert_eq!(directives.lines()[1], "ControlPort 19051");
    }

    #[test]
    fn test_equal_ports_are_rejected() {
        let mut cfg = cfg_with_bridge(BridgeMode::None);
        cfg.control_port = cfg.socks_port;
        let err = resolve(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::PortClash(9050)));
    }

    #[test]
    fn test_zero_port_is_rejected() {
        let mut cfg = cfg_with_bridge(BridgeMode::None);
        cfg.socks_port = 0;
        assert!(matches!(
            resolve(&cfg).unwrap_err(),
            ConfigError::InvalidPort { role: "socks" }
        ));

        let mut cfg = cfg_with_bridge(BridgeMode::None);
        cfg.control_port = 0;
        assert!(matches!(
            resolve(&cfg).unwrap_err(),
            ConfigError::InvalidPort { role: "control" }
        ));
    }

    #[test]
    fn test_transport_exec_picks_first_existing_candidate() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("snowflake-client");
        std::fs::write(&real, "").unwrap();

        let mut cfg = cfg_with_bridge(BridgeMode::Snowflake);
        cfg.pt_paths.insert(
            constants::SNOWFLAKE_CLIENT.to_string(),
            format!("/definitely/not/here:{}", real.display()),
        );
        let directives = resolve(&cfg).unwrap();
        let plugin = &directives.lines()[6];
        assert!(plugin.contains(&real.display().to_string()), "{plugin}");
    }

    #[test]
    fn test_transport_exec_falls_back_to_bare_name() {
        let mut cfg = cfg_with_bridge(BridgeMode::Snowflake);
        cfg.pt_paths.insert(
            constants::SNOWFLAKE_CLIENT.to_string(),
            "/nope/one:/nope/two".to_string(),
        );
        let directives = resolve(&cfg).unwrap();
        assert_eq!(
            directives.lines()[6],
            "ClientTransportPlugin snowflake exec snowflake-client -log /dev/null"
        );

        // Same fallback when the key is missing entirely
        cfg.pt_paths.remove(constants::SNOWFLAKE_CLIENT);
        let directives = resolve(&cfg).unwrap();
        assert_eq!(
            directives.lines()[6],
            "ClientTransportPlugin snowflake exec snowflake-client -log /dev/null"
        );
    }
}
