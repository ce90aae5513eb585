//! Turns raw listing output into `ProcessRecord`s.
//!
//! This module provides:
//! - `unix`: whitespace separated `ps` lines (Linux and macOS)
//! - `win32`: one compressed JSON object per line (PowerShell)
//! - `timestamp`: start time parsing and formatting

pub mod timestamp;
pub mod unix;
pub mod win32;

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::platform::Platform;
use crate::record::ProcessRecord;

/// Errors for a single listing line. The sampler skips the line and continues.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unparseable start time '{0}'")]
    Timestamp(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Line parser bound to one platform and key list.
#[derive(Debug, Clone)]
pub struct LineParser {
    platform: Platform,
    keys: Vec<String>,
    lookup_user: Option<Vec<String>>,
}

impl LineParser {
    pub fn new(platform: Platform, keys: Vec<String>, lookup_user: Option<Vec<String>>) -> Self {
        Self {
            platform,
            keys,
            lookup_user,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn lookup_user(&self) -> Option<&[String]> {
        self.lookup_user.as_deref()
    }

    /// Parses one line of listing output.
    ///
    /// `Ok(None)` means the line was intentionally dropped (user filter or an
    /// incomplete Windows sample).
    pub fn parse(
        &self,
        line: &str,
        now: DateTime<Local>,
    ) -> Result<Option<ProcessRecord>, ParseError> {
        match self.platform {
            Platform::Linux | Platform::Mac => {
                unix::parse_line(line, &self.keys, self.lookup_user.as_deref(), now)
            }
            Platform::Windows => win32::parse_line(line, &self.keys, now),
        }
    }
}
