// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Record layout.
//!
//! [`RecordFormat`] is the `tracing_subscriber::fmt` event formatter behind
//! every engine output. Two encodings are available: `json` (one object per
//! line) and `console` (tab-separated header followed by a JSON object of the
//! fields).

use crate::engine::Level;
use crate::field::Field;
use crate::error::BuildError;
use chrono::{DateTime, FixedOffset, Local};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::field::{Field as TracingField, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

/// Event field carrying the record level
pub(crate) const LEVEL_FIELD: &str = "ctxlog.level";
/// Event field carrying the logger name
pub(crate) const LOGGER_FIELD: &str = "ctxlog.logger";
/// Event field carrying the caller file
pub(crate) const FILE_FIELD: &str = "ctxlog.file";
/// Event field carrying the caller line
pub(crate) const LINE_FIELD: &str = "ctxlog.line";
/// Event field carrying the encoded record fields
pub(crate) const FIELDS_FIELD: &str = "ctxlog.fields";

/// Prefix given to record fields whose name is taken by a record key
pub const SHADOWED_FIELD_PREFIX: &str = "fields.";

/// Record encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// One JSON object per record
    #[default]
    Json,

    /// Human-oriented tab-separated output
    Console,
}

impl Encoding {
    /// Name of the encoding as used in configuration
    pub const fn as_str(self) -> &'static str {
        match self {
            Encoding::Json => "json",
            Encoding::Console => "console",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Encoding::Json),
            "console" => Ok(Encoding::Console),
            _ => Err(BuildError::UnknownEncoding(s.to_string())),
        }
    }
}

/// How levels are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelEncoder {
    /// `info`
    Lowercase,
    /// `INFO`
    Capital,
}

/// How timestamps are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeEncoder {
    /// `2024-05-01T10:20:30.123+0200`, or a trailing `Z` in UTC
    Iso8601,
    /// Floating point seconds since the Unix epoch
    EpochSeconds,
}

impl TimeEncoder {
    fn encode(self, time: &DateTime<FixedOffset>) -> Value {
        match self {
            TimeEncoder::Iso8601 if time.offset().local_minus_utc() == 0 => {
                Value::String(time.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
            }
            TimeEncoder::Iso8601 => {
                Value::String(time.format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string())
            }
            TimeEncoder::EpochSeconds => {
                Value::from(time.timestamp_micros() as f64 / 1_000_000.0)
            }
        }
    }
}

/// How caller locations are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerEncoder {
    /// The file path as compiled, plus line
    Full,
    /// Last directory and file name, plus line
    Short,
}

/// Keys and value renderings used by the encoders.
///
/// An empty key leaves the corresponding entry out of every record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Key of the rendered message
    pub message_key: String,
    /// Key of the level
    pub level_key: String,
    /// Key of the timestamp
    pub time_key: String,
    /// Key of the logger name
    pub name_key: String,
    /// Key of the caller location
    pub caller_key: String,
    /// Appended after every record
    pub line_ending: String,
    /// Level rendering
    pub level_encoder: LevelEncoder,
    /// Timestamp rendering
    pub time_encoder: TimeEncoder,
    /// Caller rendering
    pub caller_encoder: CallerEncoder,
}

impl EncoderConfig {
    /// Canonical keys, lowercase levels, ISO-8601 timestamps and full caller
    /// paths. No stack traces.
    pub fn baseline() -> Self {
        EncoderConfig {
            message_key: "message".to_string(),
            level_key: "level".to_string(),
            time_key: "time".to_string(),
            name_key: "logger".to_string(),
            caller_key: "caller".to_string(),
            line_ending: "\n".to_string(),
            level_encoder: LevelEncoder::Lowercase,
            time_encoder: TimeEncoder::Iso8601,
            caller_encoder: CallerEncoder::Full,
        }
    }

    /// Production preset: short keys, epoch timestamps, trimmed callers.
    pub fn production() -> Self {
        EncoderConfig {
            message_key: "msg".to_string(),
            time_key: "ts".to_string(),
            time_encoder: TimeEncoder::EpochSeconds,
            caller_encoder: CallerEncoder::Short,
            ..Self::baseline()
        }
    }

    /// Whether `key` names one of the entries every record starts with
    pub fn is_record_key(&self, key: &str) -> bool {
        !key.is_empty()
            && [
                &self.message_key,
                &self.level_key,
                &self.time_key,
                &self.name_key,
                &self.caller_key,
            ]
            .iter()
            .any(|reserved| reserved.as_str() == key)
    }

    fn level(&self, level: Level) -> &'static str {
        match self.level_encoder {
            LevelEncoder::Lowercase => level.as_str(),
            LevelEncoder::Capital => level.as_capital_str(),
        }
    }

    fn caller(&self, file: &str, line: u64) -> String {
        match self.caller_encoder {
            CallerEncoder::Full => format!("{}:{}", file, line),
            CallerEncoder::Short => format!("{}:{}", trim_path(file), line),
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::baseline()
    }
}

fn trim_path(file: &str) -> &str {
    let is_sep = |c: char| c == '/' || c == '\\';
    let Some(last) = file.rfind(is_sep) else {
        return file;
    };
    match file[..last].rfind(is_sep) {
        Some(prev) => &file[prev + 1..],
        None => file,
    }
}

/// Encode field groups, in order, as one JSON object.
///
/// A later field replaces an earlier one of the same name. Fields named like
/// a record key are kept under [`SHADOWED_FIELD_PREFIX`] so they never
/// replace the level, message, or any other record entry.
pub(crate) fn encode_fields(config: &EncoderConfig, groups: &[&[Field]]) -> String {
    let mut map = Map::new();
    for field in groups.iter().flat_map(|group| group.iter()) {
        let key = if config.is_record_key(&field.key) {
            format!("{}{}", SHADOWED_FIELD_PREFIX, field.key)
        } else {
            field.key.clone()
        };
        map.insert(key, field.value.clone());
    }
    Value::Object(map).to_string()
}

/// The engine's record fields read back from an event.
#[derive(Debug, Default)]
pub(crate) struct EventRecord {
    pub level: Option<Level>,
    pub logger: Option<String>,
    pub file: Option<String>,
    pub line: Option<u64>,
    pub message: String,
    /// Encoded JSON object, see [`encode_fields`]
    pub fields: String,
}

impl EventRecord {
    fn field_entries(&self) -> &str {
        self.fields
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .unwrap_or_default()
    }
}

impl Visit for EventRecord {
    fn record_str(&mut self, field: &TracingField, value: &str) {
        match field.name() {
            LEVEL_FIELD => self.level = value.parse().ok(),
            LOGGER_FIELD => self.logger = Some(value.to_string()),
            FILE_FIELD => self.file = Some(value.to_string()),
            FIELDS_FIELD => self.fields = value.to_string(),
            "message" => self.message = value.to_string(),
            _ => {}
        }
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        if field.name() == LINE_FIELD {
            self.line = Some(value);
        }
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}

impl Encoding {
    /// Render one record, line ending included.
    pub(crate) fn encode(
        self,
        config: &EncoderConfig,
        level: Level,
        time: &DateTime<FixedOffset>,
        record: &EventRecord,
    ) -> serde_json::Result<String> {
        let mut line = match self {
            Encoding::Json => encode_json(config, level, time, record)?,
            Encoding::Console => encode_console(config, level, time, record),
        };
        line.push_str(&config.line_ending);
        Ok(line)
    }
}

fn encode_json(
    config: &EncoderConfig,
    level: Level,
    time: &DateTime<FixedOffset>,
    record: &EventRecord,
) -> serde_json::Result<String> {
    let mut head = Map::new();

    if !config.level_key.is_empty() {
        head.insert(config.level_key.clone(), Value::from(config.level(level)));
    }
    if !config.time_key.is_empty() {
        head.insert(config.time_key.clone(), config.time_encoder.encode(time));
    }
    if let Some(name) = record.logger.as_ref().filter(|_| !config.name_key.is_empty()) {
        head.insert(config.name_key.clone(), Value::from(name.as_str()));
    }
    if let (Some(file), Some(line)) = (&record.file, record.line) {
        if !config.caller_key.is_empty() {
            head.insert(config.caller_key.clone(), Value::from(config.caller(file, line)));
        }
    }
    if !config.message_key.is_empty() {
        head.insert(config.message_key.clone(), Value::from(record.message.as_str()));
    }

    let mut out = serde_json::to_string(&head)?;
    let entries = record.field_entries();
    if !entries.is_empty() {
        out.pop();
        if !head.is_empty() {
            out.push(',');
        }
        out.push_str(entries);
        out.push('}');
    }
    Ok(out)
}

fn encode_console(
    config: &EncoderConfig,
    level: Level,
    time: &DateTime<FixedOffset>,
    record: &EventRecord,
) -> String {
    let mut elements: Vec<String> = Vec::with_capacity(6);

    if !config.time_key.is_empty() {
        elements.push(match config.time_encoder.encode(time) {
            Value::String(s) => s,
            other => other.to_string(),
        });
    }
    if !config.level_key.is_empty() {
        elements.push(config.level(level).to_string());
    }
    if let Some(name) = record.logger.as_ref().filter(|_| !config.name_key.is_empty()) {
        elements.push(name.clone());
    }
    if let (Some(file), Some(line)) = (&record.file, record.line) {
        if !config.caller_key.is_empty() {
            elements.push(config.caller(file, line));
        }
    }
    if !config.message_key.is_empty() {
        elements.push(record.message.clone());
    }

    let mut out = elements.join("\t");
    if !record.field_entries().is_empty() {
        out.push('\t');
        out.push_str(&record.fields);
    }
    out
}

/// Event formatter installed on every output layer of an engine.
#[derive(Debug, Clone)]
pub(crate) struct RecordFormat {
    encoding: Encoding,
    config: Arc<EncoderConfig>,
}

impl RecordFormat {
    pub(crate) fn new(encoding: Encoding, config: Arc<EncoderConfig>) -> Self {
        RecordFormat { encoding, config }
    }
}

impl<S, N> FormatEvent<S, N> for RecordFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut record = EventRecord::default();
        event.record(&mut record);
        let level = record
            .level
            .unwrap_or_else(|| Level::from(event.metadata().level()));
        let now = Local::now().fixed_offset();

        let line = self
            .encoding
            .encode(&self.config, level, &now, &record)
            .map_err(|_| fmt::Error)?;
        writer.write_str(&line)
    }
}
