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

//! Logger construction and tracing installation.

use crate::config::Config;
use crate::encoder::{EncoderConfig, Encoding};
use crate::engine::{Engine, Level};
use crate::error::{LogError, LogResult};
use crate::layer::EngineLayer;
use crate::logger::Logger;
use std::io;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

impl Logger {
    /// Build a root logger from `config`.
    ///
    /// A configuration that cannot be translated fails with
    /// [`LogError::Convert`]; an engine that cannot be built (unknown
    /// encoding, unopenable output) fails with [`LogError::Build`].
    ///
    /// # Example
    ///
    /// ```ignore
    /// use ctxlog::{Config, Logger};
    ///
    /// let logger = Logger::new(
    ///     &Config::new()
    ///         .with_level("debug")
    ///         .with_output_paths(["stdout"])
    ///         .with_initial_field("service", "billing"),
    /// )?;
    /// logger.info("ready");
    /// ```
    #[track_caller]
    pub fn new(config: &Config) -> LogResult<Logger> {
        let engine_config = config.to_engine_config()?;
        tracing::debug!(
            encoding = %engine_config.encoding,
            level = %engine_config.level,
            outputs = ?engine_config.output_paths,
            "translated logger configuration"
        );

        let engine = engine_config.build()?;
        let logger = Logger::from_engine(engine);

        logger.info("Logger construction succeeded");
        Ok(logger)
    }

    /// Root logger with the production preset: JSON on stderr at info level,
    /// short keys (`msg`, `ts`), epoch timestamps and trimmed callers.
    pub fn new_by_default() -> Logger {
        let engine = Engine::builder()
            .with_level(Level::Info)
            .with_encoding(Encoding::Json)
            .with_encoder_config(EncoderConfig::production())
            .with_output("stderr", io::stderr)
            .build();
        Logger::from_engine(engine)
    }

    /// Wrap an engine built elsewhere.
    pub fn from_engine(engine: Engine) -> Logger {
        Logger::with_engine(engine)
    }
}

/// Install `logger` as the global `tracing` subscriber.
///
/// Afterwards `tracing::info!` and friends are written by `logger`, with its
/// fields attached. `RUST_LOG` directives, when set, further narrow which
/// events reach it. Only one global subscriber can exist per process; a
/// second call fails with [`LogError::Init`].
pub fn init_tracing(logger: &Logger) -> LogResult<()> {
    Registry::default()
        .with(build_env_filter(logger))
        .with(EngineLayer::new(logger.clone()))
        .try_init()
        .map_err(|e| LogError::Init(e.to_string()))
}

/// `RUST_LOG` if it parses, otherwise the logger's own minimum level
fn build_env_filter(logger: &Logger) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logger.engine().level().filter().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BuildError, ConfigError};

    // Tests that install the global subscriber live in tests/, since it can
    // only be set once per process.

    #[test]
    fn test_new_with_stdout() {
        let logger = Logger::new(&Config::new().with_output_paths(["stdout"]));
        assert!(logger.is_ok());
    }

    #[test]
    fn test_new_rejects_unknown_level() {
        let err = Logger::new(&Config::new().with_level("notalevel")).unwrap_err();
        assert!(matches!(
            err,
            LogError::Convert(ConfigError::InvalidLevel { ref level }) if level == "notalevel"
        ));
        assert!(err.to_string().contains("notalevel"));
    }

    #[test]
    fn test_new_rejects_unknown_encoding() {
        let err = Logger::new(&Config::new().with_encoding("xml")).unwrap_err();
        assert!(matches!(err, LogError::Build(BuildError::UnknownEncoding(_))));
    }

    #[test]
    fn test_env_filter_falls_back_to_logger_level() {
        let logger = Logger::from_engine(Engine::builder().with_level(Level::Warn).build());
        if std::env::var_os(EnvFilter::DEFAULT_ENV).is_none() {
            let filter = build_env_filter(&logger);
            assert_eq!(filter.max_level_hint(), Some(Level::Warn.filter()));
        }
    }

    #[test]
    fn test_new_by_default() {
        let logger = Logger::new_by_default();
        assert_eq!(logger.engine().level(), Level::Info);
        assert_eq!(logger.engine().encoding(), Encoding::Json);
        assert!(logger.fields().is_empty());
    }
}
