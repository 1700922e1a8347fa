//! Shared scaffolding for tortray integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A throwaway config/log directory handed to the CLI via `--config-dir`
pub struct TestProfile {
    dir: TempDir,
}

impl TestProfile {
    pub fn new() -> Self {
        TestProfile {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.path().join("tor.log")
    }

    /// Overwrite config.json with raw JSON (missing fields take defaults)
    pub fn write_config(&self, json: &str) {
        fs::write(self.config_path(), json).unwrap();
    }

    pub fn read_config(&self) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(self.config_path()).unwrap()).unwrap()
    }

    pub fn read_log(&self) -> String {
        fs::read_to_string(self.log_path()).unwrap()
    }
}

/// Write an executable shell script that stands in for the tor binary
pub fn write_fake_daemon(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
    path
}
