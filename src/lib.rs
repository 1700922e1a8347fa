//! tortray - Tor Client Supervision Library
//!
//! This library exposes the building blocks of the tortray binary:
//! preference storage, torrc generation, the tor process supervisor,
//! health polling, and the shared session log.

#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod constants;
pub mod control;
pub mod logsink;
pub mod monitor;
pub mod supervisor;
pub mod torrc;
