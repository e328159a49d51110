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

//! Error types.
//!
//! Configuration problems and environment problems are kept apart so an
//! operator can tell a malformed configuration from an unwritable output.
//! Flush failures are plain [`std::io::Error`]s.

use std::io;
use thiserror::Error;
use tracing_appender::rolling::InitError;

/// The configuration record could not be read or translated
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "unrecognized level {level:?}, expected one of: debug, info, warn, error, dpanic, panic, fatal"
    )]
    InvalidLevel { level: String },

    #[error("IO error reading configuration file: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The engine could not be built from a valid configuration
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("no encoder registered for name {0:?}, expected one of: json, console")]
    UnknownEncoding(String),

    #[error("could not open output {path:?}: {source}")]
    OpenOutput {
        path: String,
        #[source]
        source: InitError,
    },
}

/// Logger construction or installation failed
#[derive(Error, Debug)]
pub enum LogError {
    #[error("could not convert configuration: {0}")]
    Convert(#[from] ConfigError),

    #[error("could not build logger from configuration: {0}")]
    Build(#[from] BuildError),

    #[error("could not install tracing subscriber: {0}")]
    Init(String),
}

/// Result type for reading and translating configuration
pub type ConfigResult<T> = Result<T, ConfigError>;
/// Result type for logger construction
pub type LogResult<T> = Result<T, LogError>;
