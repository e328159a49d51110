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

//! ctxlog
//!
//! A structured logging facade that carries request and correlation IDs from
//! inbound HTTP requests into every record logged while handling them.
//!
//! # Features
//!
//! - **Decoration**: [`Logger::with`] derives a logger that adds the IDs found
//!   in a request [`Context`] plus caller-supplied name/value pairs
//! - **Request IDs**: [`with_request`] adopts `X-Request-ID` or generates a
//!   UUID, and propagates `X-Correlation-ID` when present
//! - **Configuration**: [`Config`] (optionally from TOML) translated onto a
//!   fixed JSON baseline; invalid levels fail construction
//! - **Tracing bridge**: [`init_tracing`] routes `tracing` events through a
//!   logger
//!
//! # Example
//!
//! ```ignore
//! use ctxlog::{args, log_info, with_request, Config, Context, Logger};
//!
//! let root = Logger::new(&Config::new().with_output_paths(["stdout"]))?;
//!
//! // per request
//! let ctx = with_request(&Context::new(), &request);
//! let logger = root.with(Some(&ctx), args!["route", "/orders"]);
//! log_info!(logger, "created order {}", order_id);
//! ```

pub mod config;
pub mod context;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod field;
pub mod initialization;
pub mod layer;
pub mod logger;
pub mod macros;
pub mod output;
pub mod request;

pub use config::{Config, EngineConfig};
pub use context::Context;
pub use encoder::{
    CallerEncoder, EncoderConfig, Encoding, LevelEncoder, TimeEncoder, SHADOWED_FIELD_PREFIX,
};
pub use engine::{Caller, Engine, EngineBuilder, Entry, Level};
pub use error::{BuildError, ConfigError, LogError};
pub use field::{Arg, Field, Sprint};
pub use initialization::init_tracing;
pub use layer::EngineLayer;
pub use logger::{Logger, CORRELATION_ID_FIELD, REQUEST_ID_FIELD};
pub use output::{AddSync, FileOutput};
pub use request::{correlation_id, request_id, with_request, CORRELATION_ID_HEADER, REQUEST_ID_HEADER};
