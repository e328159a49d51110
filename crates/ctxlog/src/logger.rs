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

//! The logger handle.
//!
//! A [`Logger`] pairs an [`Engine`] with the fields accumulated through
//! decoration. Decorating never changes a logger; it hands back a new one that
//! shares the engine.

use crate::context::{Context, ContextKey};
use crate::encoder::encode_fields;
use crate::engine::{Caller, Engine, Entry, Level};
use crate::field::{sweeten, Arg, Field};
use serde_json::{json, Value};
use std::fmt;
use std::io;
use std::panic::Location;
use std::sync::Arc;

/// Field name carrying the request ID
pub const REQUEST_ID_FIELD: &str = "RequestID";

/// Field name carrying the correlation ID
pub const CORRELATION_ID_FIELD: &str = "CorrelationID";

/// Structured logger.
///
/// Cheap to clone and safe to share between threads.
#[derive(Clone)]
pub struct Logger {
    engine: Engine,
    fields: Arc<[Field]>,
    /// The engine's initial fields followed by `fields`, encoded once
    encoded: Arc<str>,
    name: Option<Arc<str>>,
}

impl Logger {
    pub(crate) fn with_engine(engine: Engine) -> Self {
        let encoded = encode_fields(engine.encoder(), &[engine.initial_fields()]);
        Logger {
            engine,
            fields: Arc::from(Vec::new()),
            encoded: encoded.into(),
            name: None,
        }
    }

    /// Log at debug level
    #[track_caller]
    pub fn debug(&self, msg: impl fmt::Display) {
        self.log(Level::Debug, format_args!("{}", msg));
    }

    /// Log at info level
    #[track_caller]
    pub fn info(&self, msg: impl fmt::Display) {
        self.log(Level::Info, format_args!("{}", msg));
    }

    /// Log at warn level
    #[track_caller]
    pub fn warn(&self, msg: impl fmt::Display) {
        self.log(Level::Warn, format_args!("{}", msg));
    }

    /// Log at error level
    #[track_caller]
    pub fn error(&self, msg: impl fmt::Display) {
        self.log(Level::Error, format_args!("{}", msg));
    }

    /// Log a formatted message at debug level. See [`log_debug!`](crate::log_debug).
    #[track_caller]
    pub fn debugf(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    /// Log a formatted message at info level. See [`log_info!`](crate::log_info).
    #[track_caller]
    pub fn infof(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    /// Log a formatted message at warn level. See [`log_warn!`](crate::log_warn).
    #[track_caller]
    pub fn warnf(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    /// Log a formatted message at error level. See [`log_error!`](crate::log_error).
    #[track_caller]
    pub fn errorf(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    /// Generic print-style output. Always logs at debug level.
    #[track_caller]
    pub fn print(&self, msg: impl fmt::Display) {
        self.debug(msg);
    }

    /// Generic formatted print. Always logs at debug level.
    #[track_caller]
    pub fn printf(&self, args: fmt::Arguments<'_>) {
        self.debugf(args);
    }

    /// Flush every output. Failures are returned as they are.
    pub fn sync(&self) -> io::Result<()> {
        self.engine.sync()
    }

    /// The underlying engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Name attached to records, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Fields attached to every record of this logger
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// A logger whose records carry `name`. Names nest with `.`.
    pub fn named(&self, name: &str) -> Logger {
        if name.is_empty() {
            return self.clone();
        }
        let name: Arc<str> = match &self.name {
            Some(parent) => format!("{}.{}", parent, name).into(),
            None => name.into(),
        };
        Logger {
            name: Some(name),
            ..self.clone()
        }
    }

    /// Derive a logger that adds the request identifiers found in `ctx` and
    /// the given arguments to every record.
    ///
    /// `args` is read as alternating name/value pairs (see [`args!`](crate::args));
    /// [`Field`] entries are taken as they are. Identifiers that are absent
    /// or not stored as strings are skipped. When nothing is added the
    /// returned logger shares this one's fields.
    ///
    /// Malformed pairs are dropped and reported at error level.
    #[track_caller]
    pub fn with(&self, ctx: Option<&Context>, mut args: Vec<Arg>) -> Logger {
        if let Some(ctx) = ctx {
            if let Some(id) = ctx.string(ContextKey::RequestId) {
                args.push(Field::string(REQUEST_ID_FIELD, id).into());
            }
            if let Some(id) = ctx.string(ContextKey::CorrelationId) {
                args.push(Field::string(CORRELATION_ID_FIELD, id).into());
            }
        }

        if args.is_empty() {
            return self.clone();
        }

        let sweetened = sweeten(args);
        let caller = Some(Caller::from(Location::caller()));
        if let Some(key) = sweetened.dangling {
            self.write(
                Level::Error,
                "Ignored key without a value.",
                caller,
                &[Field::new("ignored", key)],
            );
        }
        if !sweetened.invalid.is_empty() {
            let invalid: Vec<Value> = sweetened
                .invalid
                .into_iter()
                .map(|(key, value)| json!({ "key": key, "value": value }))
                .collect();
            self.write(
                Level::Error,
                "Ignored key-value pairs with non-string keys.",
                caller,
                &[Field::new("invalid", invalid)],
            );
        }

        let mut fields = Vec::with_capacity(self.fields.len() + sweetened.fields.len());
        fields.extend_from_slice(&self.fields);
        fields.extend(sweetened.fields);
        let encoded = encode_fields(
            self.engine.encoder(),
            &[self.engine.initial_fields(), fields.as_slice()],
        );

        Logger {
            engine: self.engine.clone(),
            fields: fields.into(),
            encoded: encoded.into(),
            name: self.name.clone(),
        }
    }

    #[track_caller]
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if !self.engine.enabled(level) {
            return;
        }
        let caller = Caller::from(Location::caller());
        let message = args.to_string();
        self.write(level, &message, Some(caller), &[]);
    }

    /// Write one record carrying this logger's fields followed by `extra`.
    pub(crate) fn write(&self, level: Level, message: &str, caller: Option<Caller>, extra: &[Field]) {
        if !self.engine.enabled(level) {
            return;
        }
        let entry = Entry {
            level,
            logger_name: self.name.as_deref(),
            caller,
            message,
        };
        if extra.is_empty() {
            self.engine.emit(&entry, &self.encoded);
        } else {
            let mut fields = Vec::with_capacity(self.fields.len() + extra.len());
            fields.extend_from_slice(&self.fields);
            fields.extend_from_slice(extra);
            self.engine.write(&entry, &fields);
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("fields", &self.fields.len())
            .field("engine", &self.engine)
            .finish()
    }
}
