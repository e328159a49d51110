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

//! The structured-logging engine.
//!
//! An [`Engine`] owns a private `tracing` dispatcher: a [`Registry`] with one
//! `tracing_subscriber::fmt` layer per output, gated by a [`LevelFilter`].
//! Records are emitted as events on that dispatcher and laid out by
//! [`RecordFormat`]. The engine is the raw handle behind every
//! [`Logger`](crate::Logger) and can be used directly when the facade is too
//! narrow.

use crate::encoder::{encode_fields, EncoderConfig, Encoding, RecordFormat};
use crate::error::ConfigError;
use crate::field::Field;
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Arc;
use tracing::Dispatch;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::Registry;

/// Target of every event an engine emits
const TARGET: &str = "ctxlog";

/// Record severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Diagnostic output
    Debug,
    /// Normal operation
    Info,
    /// Something unexpected that did not fail the operation
    Warn,
    /// A failed operation
    Error,
    /// Threshold only
    DPanic,
    /// Threshold only
    Panic,
    /// Threshold only
    Fatal,
}

impl Level {
    /// Tokens accepted by [`Level::from_str`], besides the empty string
    pub const TOKENS: [&'static str; 7] =
        ["debug", "info", "warn", "error", "dpanic", "panic", "fatal"];

    /// Lowercase name
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::DPanic => "dpanic",
            Level::Panic => "panic",
            Level::Fatal => "fatal",
        }
    }

    /// Uppercase name
    pub const fn as_capital_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::DPanic => "DPANIC",
            Level::Panic => "PANIC",
            Level::Fatal => "FATAL",
        }
    }

    /// The `tracing` filter letting this level through. Levels above error
    /// travel as error events.
    pub const fn filter(self) -> LevelFilter {
        match self {
            Level::Debug => LevelFilter::DEBUG,
            Level::Info => LevelFilter::INFO,
            Level::Warn => LevelFilter::WARN,
            Level::Error | Level::DPanic | Level::Panic | Level::Fatal => LevelFilter::ERROR,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ConfigError;

    /// Case-insensitive. The empty string means `info`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" | "" => Ok(Level::Info),
            "warn" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "dpanic" => Ok(Level::DPanic),
            "panic" => Ok(Level::Panic),
            "fatal" => Ok(Level::Fatal),
            _ => Err(ConfigError::InvalidLevel {
                level: s.to_string(),
            }),
        }
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Source location of a log call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    /// File path as compiled
    pub file: &'static str,
    /// Line number
    pub line: u32,
}

impl From<&'static std::panic::Location<'static>> for Caller {
    fn from(location: &'static std::panic::Location<'static>) -> Self {
        Caller {
            file: location.file(),
            line: location.line(),
        }
    }
}

/// Everything about a record except its fields. The time is taken when the
/// record is laid out.
#[derive(Debug, Clone)]
pub struct Entry<'a> {
    /// Severity
    pub level: Level,
    /// Name of the emitting logger
    pub logger_name: Option<&'a str>,
    /// Call site
    pub caller: Option<Caller>,
    /// Rendered message
    pub message: &'a str,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;
type LayerFactory = Box<dyn FnOnce(RecordFormat) -> BoxedLayer + Send>;
type Flush = Box<dyn Fn() -> io::Result<()> + Send + Sync>;

struct Output {
    name: String,
    flush: Flush,
}

struct EngineInner {
    level: Level,
    encoding: Encoding,
    encoder: Arc<EncoderConfig>,
    initial_fields: Vec<Field>,
    dispatch: Dispatch,
    outputs: Vec<Output>,
}

/// Raw engine handle. Cloning is cheap and shares the outputs.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Start building an engine from pre-opened outputs
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Minimum level written
    pub fn level(&self) -> Level {
        self.inner.level
    }

    /// Record encoding
    pub fn encoding(&self) -> Encoding {
        self.inner.encoding
    }

    /// Keys and renderings used for every record
    pub fn encoder(&self) -> &EncoderConfig {
        &self.inner.encoder
    }

    /// Fields attached to every record at build time
    pub fn initial_fields(&self) -> &[Field] {
        &self.inner.initial_fields
    }

    /// Whether a record at `level` would be written
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.inner.level
    }

    /// Write `entry` with the engine's initial fields followed by `fields`
    /// to every output.
    ///
    /// A failing output is reported on stderr by `tracing_subscriber` and
    /// skipped; the others still receive the record.
    pub fn write(&self, entry: &Entry<'_>, fields: &[Field]) {
        if !self.enabled(entry.level) {
            return;
        }
        let encoded = encode_fields(self.encoder(), &[self.initial_fields(), fields]);
        self.emit(entry, &encoded);
    }

    /// Emit `entry` with fields already run through [`encode_fields`].
    pub(crate) fn emit(&self, entry: &Entry<'_>, fields: &str) {
        if !self.enabled(entry.level) {
            return;
        }

        let file = entry.caller.map(|caller| caller.file);
        let line = entry.caller.map(|caller| u64::from(caller.line));

        macro_rules! emit_at {
            ($level:expr) => {
                tracing::event!(
                    target: TARGET,
                    $level,
                    ctxlog.level = entry.level.as_str(),
                    ctxlog.logger = entry.logger_name,
                    ctxlog.file = file,
                    ctxlog.line = line,
                    ctxlog.fields = fields,
                    message = entry.message,
                )
            };
        }

        tracing::dispatcher::with_default(&self.inner.dispatch, || match entry.level {
            Level::Debug => emit_at!(tracing::Level::DEBUG),
            Level::Info => emit_at!(tracing::Level::INFO),
            Level::Warn => emit_at!(tracing::Level::WARN),
            Level::Error | Level::DPanic | Level::Panic | Level::Fatal => {
                emit_at!(tracing::Level::ERROR)
            }
        });
    }

    /// Flush every output. All outputs are attempted; the first failure is
    /// returned.
    pub fn sync(&self) -> io::Result<()> {
        let mut first_error = None;
        for output in &self.inner.outputs {
            if let Err(e) = (output.flush)() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outputs: Vec<&str> = self.inner.outputs.iter().map(|o| o.name.as_str()).collect();
        f.debug_struct("Engine")
            .field("level", &self.inner.level)
            .field("encoding", &self.inner.encoding)
            .field("outputs", &outputs)
            .finish_non_exhaustive()
    }
}

/// Builder for an [`Engine`] over already opened outputs.
pub struct EngineBuilder {
    level: Level,
    encoding: Encoding,
    encoder: EncoderConfig,
    initial_fields: Vec<Field>,
    layers: Vec<LayerFactory>,
    outputs: Vec<Output>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        EngineBuilder {
            level: Level::Info,
            encoding: Encoding::Json,
            encoder: EncoderConfig::baseline(),
            initial_fields: Vec::new(),
            layers: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

impl EngineBuilder {
    /// Set the minimum level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set the encoding
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Replace the encoder keys and renderings
    pub fn with_encoder_config(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = encoder;
        self
    }

    /// Attach a field to every record
    pub fn with_initial_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.initial_fields.push(Field::new(key, value));
        self
    }

    /// Add an output; `name` only appears in diagnostics.
    ///
    /// Any [`MakeWriter`] works: `std::io::stdout`, a
    /// [`FileOutput`](crate::FileOutput), or a clonable writer wrapped in
    /// [`AddSync`](crate::AddSync).
    pub fn with_output<W>(mut self, name: impl Into<String>, writer: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Clone + Send + Sync + 'static,
    {
        let flusher = writer.clone();
        self.outputs.push(Output {
            name: name.into(),
            flush: Box::new(move || flusher.make_writer().flush()),
        });
        self.layers.push(Box::new(move |format: RecordFormat| -> BoxedLayer {
            tracing_subscriber::fmt::layer()
                .event_format(format)
                .with_writer(writer)
                .boxed()
        }));
        self
    }

    /// Finish the engine
    pub fn build(self) -> Engine {
        let encoder = Arc::new(self.encoder);
        let layers: Vec<BoxedLayer> = self
            .layers
            .into_iter()
            .map(|layer| layer(RecordFormat::new(self.encoding, Arc::clone(&encoder))))
            .collect();

        let subscriber = Registry::default()
            .with(layers)
            .with(self.level.filter());

        Engine {
            inner: Arc::new(EngineInner {
                level: self.level,
                encoding: self.encoding,
                encoder,
                initial_fields: self.initial_fields,
                dispatch: Dispatch::new(subscriber),
                outputs: self.outputs,
            }),
        }
    }
}
