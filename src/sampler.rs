//! Sampling loop.
//!
//! A `Sampler` owns the resolved settings, the output sink and its statistics.
//! On every tick it runs the listing command, skips the header line, parses
//! each following line and hands successfully parsed records to the sink.
//! A failing line is skipped; a failing tick is logged and the next tick still
//! fires on schedule.

use chrono::{Local, Utc};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::command::{self, shell_command};
use crate::config::{validate_effective_config, Config, ConfigError};
use crate::parser::LineParser;
use crate::platform::Platform;
use crate::sink::{RecordSink, SinkError};
use crate::stats::SamplerStats;
use crate::tag::resolve_tag;
use crate::types::TypeMap;

/// Errors that end a tick early.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("listing command has no stdout handle")]
    NoStdout,

    #[error("I/O error while reading listing output: {0}")]
    Io(#[from] std::io::Error),

    #[error("listing command did not finish within {0:?}")]
    Timeout(Duration),

    #[error("listing command exited with {0}")]
    ExitStatus(ExitStatus),

    #[error("failed to emit record: {0}")]
    Sink(#[from] SinkError),
}

/// Counts for one completed tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub emitted: u64,
    pub skipped: u64,
    pub dropped: u64,
}

/// Everything a tick needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct SamplerSettings {
    pub tag: String,
    pub command: String,
    pub interval: Duration,
    pub timeout: Duration,
    pub parser: LineParser,
    pub types: TypeMap,
}

impl SamplerSettings {
    /// Validates `cfg` and resolves platform, keys, command, tag and types.
    pub async fn from_config(cfg: &Config) -> Result<Self, ConfigError> {
        validate_effective_config(cfg)?;

        let platform = cfg.effective_platform();
        let keys = cfg.effective_keys(platform);
        let command = command::resolve(cfg.command.as_deref(), platform, &keys);
        let raw_tag = cfg.tag.as_deref().ok_or(ConfigError::MissingTag)?;
        let tag = resolve_tag(raw_tag, cfg.hostname_command()).await?;

        Ok(Self {
            tag,
            command,
            interval: cfg.interval(),
            timeout: cfg.timeout(),
            parser: LineParser::new(platform, keys, cfg.lookup_user()),
            types: cfg.type_map()?,
        })
    }

    pub fn platform(&self) -> Platform {
        self.parser.platform()
    }
}

pub struct Sampler {
    settings: Arc<SamplerSettings>,
    sink: Arc<dyn RecordSink>,
    stats: Arc<SamplerStats>,
}

impl Sampler {
    pub fn new(settings: SamplerSettings, sink: Arc<dyn RecordSink>) -> Self {
        Self {
            settings: Arc::new(settings),
            sink,
            stats: Arc::new(SamplerStats::new()),
        }
    }

    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }

    pub fn stats(&self) -> Arc<SamplerStats> {
        Arc::clone(&self.stats)
    }

    /// Runs ticks on a fixed interval until `cancel` fires.
    ///
    /// The first tick runs immediately. Ticks never overlap; a tick that
    /// overruns its slot causes the missed slots to be skipped. Cancellation
    /// abandons an in-flight tick, killing the listing command.
    pub async fn run(&self, cancel: CancellationToken) {
        let settings = &self.settings;
        info!(
            "watch_process: polling start. tag={} lookup_user={:?} interval={:?} command={}",
            settings.tag,
            settings.parser.lookup_user(),
            settings.interval,
            settings.command
        );

        let mut ticker = tokio::time::interval(settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Abandoning in-flight tick on shutdown");
                    break;
                }
                _ = self.on_timer() => {}
            }
        }

        info!("watch_process: polling stopped");
    }

    /// Runs one tick, logging and counting its outcome. Never fails.
    pub async fn on_timer(&self) {
        let start = Instant::now();
        match self.run_tick().await {
            Ok(summary) => {
                let elapsed = start.elapsed().as_secs_f64();
                self.stats.record_tick(summary.emitted, elapsed);
                debug!(
                    "Tick completed: {} emitted, {} skipped, {} dropped, {:.2}ms",
                    summary.emitted,
                    summary.skipped,
                    summary.dropped,
                    elapsed * 1000.0
                );
            }
            Err(e) => {
                self.stats
                    .record_tick_failure(start.elapsed().as_secs_f64());
                error!("watch_process: error has occurred. {}", e);
            }
        }
    }

    /// Runs one tick bounded by the configured timeout.
    pub async fn run_tick(&self) -> Result<TickSummary, TickError> {
        let timeout = self.settings.timeout;
        match tokio::time::timeout(timeout, self.collect()).await {
            Ok(result) => result,
            Err(_) => Err(TickError::Timeout(timeout)),
        }
    }

    /// The child and its stdout are dropped on every return path; the child
    /// is killed if it is still running at that point. A non-zero exit status
    /// fails the tick.
    #[instrument(skip(self), fields(command = %self.settings.command))]
    async fn collect(&self) -> Result<TickSummary, TickError> {
        let settings = &self.settings;
        let mut child = shell_command(&settings.command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TickError::Spawn {
                command: settings.command.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or(TickError::NoStdout)?;
        let mut lines = BufReader::new(stdout).split(b'\n');
        let mut summary = TickSummary::default();

        if lines.next_segment().await?.is_none() {
            debug!("Listing command printed no header");
        }

        while let Some(raw) = lines.next_segment().await? {
            let line = String::from_utf8_lossy(&raw);
            if line.trim().is_empty() {
                continue;
            }

            match settings.parser.parse(&line, Local::now()) {
                Ok(Some(mut record)) => {
                    settings.types.apply(&mut record);
                    self.sink.emit(&settings.tag, Utc::now(), record)?;
                    self.stats.record_emitted();
                    summary.emitted += 1;
                }
                Ok(None) => {
                    self.stats.record_dropped();
                    summary.dropped += 1;
                }
                Err(e) => {
                    warn!("Skipping listing line: {} ({})", e, line.trim_end());
                    self.stats.record_line_skipped();
                    summary.skipped += 1;
                }
            }
        }
        drop(lines);

        // A missing command surfaces here, since `sh` itself always starts.
        // Records already emitted stay emitted.
        let status = child.wait().await?;
        if !status.success() {
            return Err(TickError::ExitStatus(status));
        }

        Ok(summary)
    }
}
