use super::{
    generator::GeneratorConfig,
    harness::HarnessConfig,
    seeds::SeedCorpusConfig,
    traits::ConfigSection,
};
use crate::error::PadcovError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix of environment overrides, e.g. `PADCOV__GENERATOR__SEED=7`.
pub const ENV_PREFIX: &str = "PADCOV";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub generator: GeneratorConfig,
    pub seeds: SeedCorpusConfig,
    pub harness: HarnessConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), PadcovError> {
        self.generator.validate()?;
        self.seeds.validate()?;
        self.harness.validate()?;
        Ok(())
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, PadcovError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PadcovError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PadcovError::Configuration(format!("Failed to read config: {}", e)))?;

        let config = AppConfig::from_toml_str(&contents)?;

        *self.config.write().map_err(|_| PadcovError::LockPoisoned)? = config;
        Ok(())
    }

    /// Optional config file overlaid with `PADCOV__<SECTION>__<FIELD>` variables.
    pub fn load_layered<P: AsRef<Path>>(&self, path: Option<P>) -> Result<(), PadcovError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path.as_ref()));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .and_then(|layered| layered.try_deserialize())
            .map_err(|e| PadcovError::Configuration(format!("Failed to load config: {}", e)))?;

        config.validate()?;

        *self.config.write().map_err(|_| PadcovError::LockPoisoned)? = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PadcovError> {
        let config = self.config.read().map_err(|_| PadcovError::LockPoisoned)?;
        let toml_str = toml::to_string_pretty(&*config)
            .map_err(|e| PadcovError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| PadcovError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> Result<AppConfig, PadcovError> {
        Ok(self.config.read().map_err(|_| PadcovError::LockPoisoned)?.clone())
    }

    /// Apply `f` and keep the result only if it validates.
    pub fn update<F>(&self, f: F) -> Result<(), PadcovError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.write().map_err(|_| PadcovError::LockPoisoned)?;
        let mut candidate = config.clone();
        f(&mut candidate);
        candidate.validate()?;
        *config = candidate;
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
