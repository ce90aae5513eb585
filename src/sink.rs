//! Output sinks receiving one `emit(tag, time, record)` call per process.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::record::ProcessRecord;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sink lock poisoned")]
    Poisoned,

    #[error("record receiver closed")]
    Closed,
}

/// Destination for sampled records.
pub trait RecordSink: Send + Sync {
    fn emit(&self, tag: &str, time: DateTime<Utc>, record: ProcessRecord) -> Result<(), SinkError>;
}

/// A record as handed to a sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmittedRecord {
    pub tag: String,
    pub time: DateTime<Utc>,
    pub record: ProcessRecord,
}

#[derive(Serialize)]
struct Event<'a> {
    tag: &'a str,
    time: DateTime<Utc>,
    record: &'a ProcessRecord,
}

/// Writes one JSON object per record, newline separated.
pub struct JsonLinesSink<W: Write + Send> {
    out: Mutex<W>,
}

impl JsonLinesSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> Result<W, SinkError> {
        self.out.into_inner().map_err(|_| SinkError::Poisoned)
    }
}

impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    fn emit(&self, tag: &str, time: DateTime<Utc>, record: ProcessRecord) -> Result<(), SinkError> {
        let event = Event {
            tag,
            time,
            record: &record,
        };
        let mut out = self.out.lock().map_err(|_| SinkError::Poisoned)?;
        serde_json::to_writer(&mut *out, &event)?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }
}

/// Forwards records to an unbounded tokio channel.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<EmittedRecord>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EmittedRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl RecordSink for ChannelSink {
    fn emit(&self, tag: &str, time: DateTime<Utc>, record: ProcessRecord) -> Result<(), SinkError> {
        self.tx
            .send(EmittedRecord {
                tag: tag.to_string(),
                time,
                record,
            })
            .map_err(|_| SinkError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> ProcessRecord {
        let mut record = ProcessRecord::new();
        record.insert("user", "alice");
        record.insert("pid", 1234);
        record
    }

    #[test]
    fn test_json_lines_sink_writes_one_line_per_record() {
        let sink = JsonLinesSink::new(Vec::new());
        let time = Utc.with_ymd_and_hms(2024, 1, 2, 15, 4, 5).unwrap();
        sink.emit("ps.host", time, record()).unwrap();
        sink.emit("ps.host", time, record()).unwrap();

        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            r#"{"tag":"ps.host","time":"2024-01-02T15:04:05Z","record":{"user":"alice","pid":1234}}"#
        );
    }

    #[test]
    fn test_channel_sink_forwards_and_reports_closed() {
        let (sink, mut rx) = ChannelSink::new();
        sink.emit("t", Utc::now(), record()).unwrap();
        let got = rx.try_recv().unwrap();
        assert_eq!(got.tag, "t");
        assert_eq!(got.record, record());

        drop(rx);
        assert!(matches!(
            sink.emit("t", Utc::now(), record()),
            Err(SinkError::Closed)
        ));
    }
}
