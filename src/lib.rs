//! watch-process library
//!
//! Periodically samples the operating system's process table and turns every
//! listed process into a flat, typed record for a downstream pipeline.
//!
//! # Features
//!
//! - **Platform Detection**: Linux, macOS and Windows listing layouts
//! - **Line Parsing**: `ps` text lines with embedded timestamps, or PowerShell JSON
//! - **Derived Fields**: elapsed seconds since process start
//! - **User Filtering**: optional allow-list of user names
//! - **Fault Isolation**: a bad line skips the line, a bad tick skips the tick
//!
//! # Usage
//!
//! ```rust
//! use chrono::Local;
//! use watch_process::{LineParser, Platform};
//!
//! let parser = LineParser::new(Platform::Linux, Platform::Linux.default_keys(), None);
//! let line = "Mon Jan  2 15:04:05 2024 alice 1234 1 00:00:01 1.5 2.3 10240 20480 S myproc myproc --flag";
//! let record = parser.parse(line, Local::now()).unwrap().unwrap();
//!
//! assert_eq!(record.get_str("user"), Some("alice"));
//! assert_eq!(record.get_str("command"), Some("myproc --flag"));
//! assert!(record.contains_key("elapsed_time"));
//! ```

pub mod cli;
pub mod command;
pub mod commands;
pub mod config;
pub mod parser;
pub mod platform;
pub mod record;
pub mod sampler;
pub mod sink;
pub mod stats;
pub mod tag;
pub mod types;

// Re-export main types for convenience
pub use config::{Config, ConfigError};
pub use parser::{LineParser, ParseError};
pub use platform::Platform;
pub use record::ProcessRecord;
pub use sampler::{Sampler, SamplerSettings, TickError, TickSummary};
pub use sink::{ChannelSink, EmittedRecord, JsonLinesSink, RecordSink, SinkError};
pub use stats::{SamplerStats, StatsSummary};
pub use types::{FieldType, TypeMap};
