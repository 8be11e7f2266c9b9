//! Shared configuration loader for the laudo toolchain.
//!
//! `defaults/laudo.default.toml` is embedded into every binary so that the documented
//! defaults and [`EngineConfig::default`] stay in sync. Applications layer user-specific
//! files on top of those defaults via [`Loader`] before deserializing into [`LaudoConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use laudo_engine::EngineConfig;
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/laudo.default.toml");

/// Top-level configuration consumed by laudo applications.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LaudoConfig {
    pub engine: EngineConfig,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer the TOML file passed to `laudo --config`. A missing file is an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer a settings file that may not exist, such as a `laudo.toml` kept beside the
    /// templates.
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Override one setting by its dotted key, e.g. `engine.images.width_cm`.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Merge the layers and deserialize the `[engine]` table into an [`EngineConfig`].
    pub fn build(self) -> Result<LaudoConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<LaudoConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use laudo_engine::config::{DynamicRule, EmptyPolicy};

    #[test]
    fn embedded_defaults_match_engine_defaults() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn loads_tagged_rules() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.engine.lists[2].empty, EmptyPolicy::Omit);
        assert!(matches!(
            config.engine.dynamic[3].rule,
            DynamicRule::Questions { ref skip_flag, .. } if skip_flag == "QUESITOS_AUTOR_DISPENSADOS"
        ));
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("engine.images.width_cm", 10.0)
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.engine.images.width_cm, 10.0);
    }

    #[test]
    fn user_file_replaces_sentinel_phrases() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("laudo.toml");
        std::fs::write(
            &path,
            "[engine.sentinel]\nphrases = [\"Encerramento\", \"Termo final\"]\n\n[engine.labels]\nnot_available = \"-\"\n",
        )
        .expect("user config to be written");

        let config = Loader::new().with_file(&path).build().expect("config to build");
        assert_eq!(config.engine.sentinel.phrases, vec!["Encerramento", "Termo final"]);
        assert_eq!(config.engine.labels.not_available, "-");
        assert_eq!(config.engine.labels.yes, "Sim");
    }

    #[test]
    fn optional_file_may_be_missing() {
        let config = Loader::new()
            .with_optional_file("/definitely/not/here/laudo.toml")
            .build()
            .expect("config to build");
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn required_file_must_exist() {
        let result = Loader::new()
            .with_file("/definitely/not/here/laudo.toml")
            .build();
        assert!(result.is_err());
    }
}
