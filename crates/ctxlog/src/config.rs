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

//! Logger configuration and its translation into an engine configuration.
//!
//! [`Config`] is the small record callers fill in (or load from TOML).
//! [`Config::to_engine_config`] overlays it onto a fresh
//! [`EngineConfig::baseline`], and [`EngineConfig::build`] opens the outputs.

use crate::encoder::{EncoderConfig, Encoding};
use crate::engine::{Engine, Level};
use crate::error::{BuildError, ConfigResult};
use crate::output::FileOutput;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::Path;

/// Configuration for a logger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Record encoding: `json` or `console`
    pub encoding: String,

    /// Where records go: `stdout`, `stderr`, or file paths. A `file://`
    /// prefix is accepted.
    pub output_paths: Vec<String>,

    /// Minimum level, e.g. `debug` or `info`
    pub level: String,

    /// Fields attached to every record
    pub initial_fields: Map<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            encoding: Encoding::Json.as_str().to_string(),
            output_paths: vec!["stderr".to_string()],
            level: Level::Info.as_str().to_string(),
            initial_fields: Map::new(),
        }
    }
}

impl Config {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the encoding
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Replace the output paths
    pub fn with_output_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Set the minimum level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Add a field attached to every record
    pub fn with_initial_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.initial_fields
            .insert(key.into(), crate::field::to_value(value));
        self
    }

    /// Parse a configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Translate into an engine configuration.
    ///
    /// Fails when `level` is not a recognized level token; there is no
    /// fallback level.
    pub fn to_engine_config(&self) -> ConfigResult<EngineConfig> {
        let mut cfg = EngineConfig::baseline();
        cfg.output_paths = self.output_paths.clone();
        cfg.encoding = self.encoding.clone();
        cfg.initial_fields = self.initial_fields.clone();
        cfg.level = self.level.parse()?;
        Ok(cfg)
    }
}

/// Engine-level configuration produced by [`Config::to_engine_config`]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Minimum level
    pub level: Level,

    /// Encoding name, resolved when the engine is built
    pub encoding: String,

    /// Keys and renderings
    pub encoder: EncoderConfig,

    /// Output paths, opened when the engine is built
    pub output_paths: Vec<String>,

    /// Fields attached to every record
    pub initial_fields: Map<String, Value>,
}

impl EngineConfig {
    /// JSON records with the canonical keys, info level, no outputs.
    ///
    /// Built fresh on every call.
    pub fn baseline() -> Self {
        EngineConfig {
            level: Level::Info,
            encoding: Encoding::Json.as_str().to_string(),
            encoder: EncoderConfig::baseline(),
            output_paths: Vec::new(),
            initial_fields: Map::new(),
        }
    }

    /// Resolve the encoding and open every output.
    pub fn build(&self) -> Result<Engine, BuildError> {
        let encoding: Encoding = self.encoding.parse()?;

        let mut builder = Engine::builder()
            .with_level(self.level)
            .with_encoding(encoding)
            .with_encoder_config(self.encoder.clone());

        for (key, value) in &self.initial_fields {
            builder = builder.with_initial_field(key.as_str(), value);
        }

        for path in &self.output_paths {
            builder = match path.as_str() {
                "stdout" => builder.with_output(path.as_str(), io::stdout),
                "stderr" => builder.with_output(path.as_str(), io::stderr),
                _ => {
                    let file = path.strip_prefix("file://").unwrap_or(path);
                    let output = FileOutput::open(file).map_err(|source| BuildError::OpenOutput {
                        path: path.clone(),
                        source,
                    })?;
                    builder.with_output(path.as_str(), output)
                }
            };
        }

        Ok(builder.build())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::baseline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{CallerEncoder, LevelEncoder, TimeEncoder};
    use crate::error::ConfigError;
    use serde_json::json;

    #[test]
    fn test_config_builder() {
        let config = Config::new()
            .with_encoding("console")
            .with_output_paths(["stdout", "/tmp/app.log"])
            .with_level("debug")
            .with_initial_field("service", "billing");

        assert_eq!(config.encoding, "console");
        assert_eq!(config.output_paths, vec!["stdout", "/tmp/app.log"]);
        assert_eq!(config.level, "debug");
        assert_eq!(config.initial_fields["service"], json!("billing"));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.encoding, "json");
        assert_eq!(config.output_paths, vec!["stderr"]);
        assert_eq!(config.level, "info");
        assert!(config.initial_fields.is_empty());
    }

    #[test]
    fn test_baseline_encoder() {
        let cfg = EngineConfig::baseline();
        assert_eq!(cfg.encoding, "json");
        assert_eq!(cfg.encoder.message_key, "message");
        assert_eq!(cfg.encoder.level_key, "level");
        assert_eq!(cfg.encoder.time_key, "time");
        assert_eq!(cfg.encoder.name_key, "logger");
        assert_eq!(cfg.encoder.caller_key, "caller");
        assert_eq!(cfg.encoder.line_ending, "\n");
        assert_eq!(cfg.encoder.level_encoder, LevelEncoder::Lowercase);
        assert_eq!(cfg.encoder.time_encoder, TimeEncoder::Iso8601);
        assert_eq!(cfg.encoder.caller_encoder, CallerEncoder::Full);
    }

    #[test]
    fn test_translation_overlays_caller_values() {
        let config = Config::new()
            .with_encoding("console")
            .with_output_paths(["stdout"])
            .with_level("warn")
            .with_initial_field("region", "eu-west-1");

        let cfg = config.to_engine_config().unwrap();
        assert_eq!(cfg.level, Level::Warn);
        assert_eq!(cfg.encoding, "console");
        assert_eq!(cfg.output_paths, vec!["stdout"]);
        assert_eq!(cfg.initial_fields["region"], json!("eu-west-1"));
        assert_eq!(cfg.encoder, EncoderConfig::baseline());
    }

    #[test]
    fn test_translation_copies_initial_fields() {
        let mut config = Config::new().with_initial_field("k", "before");
        let cfg = config.to_engine_config().unwrap();

        config.initial_fields.insert("k".to_string(), json!("after"));
        assert_eq!(cfg.initial_fields["k"], json!("before"));
    }

    #[test]
    fn test_translation_rejects_unknown_level() {
        let err = Config::new().with_level("notalevel").to_engine_config().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLevel { ref level } if level == "notalevel"));
        assert!(err.to_string().contains("notalevel"));
    }

    #[test]
    fn test_translation_does_not_touch_baseline() {
        let _ = Config::new()
            .with_level("debug")
            .with_output_paths(["stdout"])
            .to_engine_config()
            .unwrap();
        assert_eq!(EngineConfig::baseline().level, Level::Info);
        assert!(EngineConfig::baseline().output_paths.is_empty());
    }

    #[test]
    fn test_from_toml() {
        let config = Config::from_toml_str(
            r#"
            encoding = "json"
            output_paths = ["stdout"]
            level = "debug"

            [initial_fields]
            service = "billing"
            replicas = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.level, "debug");
        assert_eq!(config.output_paths, vec!["stdout"]);
        assert_eq!(config.initial_fields["service"], json!("billing"));
        assert_eq!(config.initial_fields["replicas"], json!(3));
    }

    #[test]
    fn test_from_toml_partial_keeps_defaults() {
        let config = Config::from_toml_str("level = \"error\"").unwrap();
        assert_eq!(config.level, "error");
        assert_eq!(config.encoding, "json");
        assert_eq!(config.output_paths, vec!["stderr"]);
    }

    #[test]
    fn test_from_toml_rejects_garbage() {
        assert!(matches!(
            Config::from_toml_str("level = [1, 2"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load(dir.path().join("absent.toml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_build_rejects_unknown_encoding() {
        let mut cfg = EngineConfig::baseline();
        cfg.encoding = "xml".to_string();
        assert!(matches!(cfg.build(), Err(BuildError::UnknownEncoding(_))));
    }

    #[test]
    fn test_build_opens_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("app.log");
        let mut cfg = EngineConfig::baseline();
        cfg.output_paths = vec![format!("file://{}", path.display())];

        let engine = cfg.build().unwrap();
        crate::Logger::from_engine(engine).warn("written");

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"written\""));
    }

    #[test]
    fn test_build_reports_unopenable_output() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let path = blocker.join("app.log");
        let mut cfg = EngineConfig::baseline();
        cfg.output_paths = vec![path.display().to_string()];

        match cfg.build() {
            Err(BuildError::OpenOutput { path: failed, .. }) => {
                assert_eq!(failed, path.display().to_string())
            }
            other => panic!("expected OpenOutput, got {:?}", other.map(|_| ())),
        }
    }
}
