//! torrc generation
//!
//! Turns persisted preferences into the throwaway torrc handed to the tor
//! child: `resolver` builds the ordered directive list, `renderer` writes
//! it out.

mod renderer;
mod resolver;

pub use renderer::{render, render_to_temp, RenderedTorrc};
pub use resolver::{resolve, TorrcDirectives};

/// Preference combinations that cannot produce a usable torrc
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no bridges configured; add obfs4 lines to obfs4_bridges in config.json (get them from https://bridges.torproject.org/)")]
    NoBridges,
    #[error("socks and control ports must differ (both set to {0})")]
    PortClash(u16),
    #[error("{role} port must be between 1 and 65535")]
    InvalidPort { role: &'static str },
}
