//! Operating system family detection.
//!
//! The platform is resolved once at startup and decides which listing command
//! is built, which default keys apply and which line parser is used.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static WINDOWS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)cygwin|mswin|mingw|bccwin|wince|emx|windows").expect("valid windows regex")
});

static MAC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)darwin|macos").expect("valid mac regex"));

/// Default keys for `ps` based listings (Linux and macOS).
pub const DEFAULT_KEYS: &[&str] = &[
    "start_time",
    "user",
    "pid",
    "parent_pid",
    "cpu_time",
    "cpu_percent",
    "memory_percent",
    "mem_rss",
    "mem_size",
    "state",
    "proc_name",
    "command",
];

/// Default keys for the PowerShell listing.
pub const DEFAULT_KEYS_WIN32: &[&str] = &[
    "StartTime",
    "UserName",
    "SessionId",
    "Id",
    "CPU",
    "WorkingSet",
    "VirtualMemorySize",
    "HandleCount",
    "ProcessName",
];

/// Operating system family the sampler runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Mac,
    Windows,
}

impl Platform {
    /// Classifies the running platform.
    pub fn detect() -> Self {
        let identifier = format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS);
        Self::classify(&identifier)
    }

    /// Classifies a platform identifier string such as `x86_64-linux` or
    /// `x86_64-mingw32`. Anything not recognized as Windows or macOS is Linux.
    pub fn classify(identifier: &str) -> Self {
        if WINDOWS_RE.is_match(identifier) {
            Platform::Windows
        } else if MAC_RE.is_match(identifier) {
            Platform::Mac
        } else {
            Platform::Linux
        }
    }

    /// Keys used when the configuration does not name any.
    pub fn default_keys(self) -> Vec<String> {
        let keys = match self {
            Platform::Windows => DEFAULT_KEYS_WIN32,
            Platform::Linux | Platform::Mac => DEFAULT_KEYS,
        };
        keys.iter().map(|k| k.to_string()).collect()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Linux => "linux",
            Platform::Mac => "mac",
            Platform::Windows => "windows",
        };
        f.write_str(name)
    }
}
