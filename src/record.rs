//! Log record construction.
//!
//! A record is built once at the emission call site and never mutated
//! afterwards; it is dropped after successful dispatch (and, when
//! persistence is on, cleared from the store by id).
use crate::level::{Level, Source};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Payload-shaping callback. Receives the emission context and the raw
/// content values and returns the payload to buffer/persist/send; the
/// pipeline makes no assumptions about its output shape.
pub type FormatFn = dyn Fn(&Context, &[Value]) -> Value + Send + Sync;

/// Fixed fields captured at emission time.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Context {
    pub time: String,
    pub version: String,
    pub source: Source,
    pub level: Level,
}

/// A pending log record: an opaque unique id plus the shaped payload.
///
/// The id never leaves the pipeline; delivery sinks only ever see the
/// payload.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LogRecord {
    pub id: String,
    pub payload: Value,
}

/// Builds a record for `contents` emitted at `level`.
///
/// Without a formatter the payload is the context merged with the
/// contents under a `contents` key; with one, the payload is whatever
/// the formatter returns.
pub fn build_record(
    level: Level,
    contents: Vec<Value>,
    source: Source,
    version: &str,
    format: Option<&FormatFn>,
) -> LogRecord {
    let context = Context {
        time: local_time(),
        version: version.to_string(),
        source,
        level,
    };

    let payload = match format {
        Some(format) => format(&context, &contents),
        None => json!({
            "time": context.time,
            "version": context.version,
            "source": context.source.as_str(),
            "level": level.as_str(),
            "contents": contents,
        }),
    };

    LogRecord {
        id: Uuid::new_v4().simple().to_string(),
        payload,
    }
}

/// Formatted local wall-clock time, second resolution.
fn local_time() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
