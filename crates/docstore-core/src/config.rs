//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_STORE__DEFAULT_K=10`).

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

pub const DEFAULT_K: usize = 5;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.store()?.validate()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self { Self { figment } }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    fn get_or_default<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        if self.figment.contains(key) { self.get(key) } else { Ok(T::default()) }
    }

    /// Typed `[store]` section with the `[text]` section folded in.
    pub fn store(&self) -> Result<StoreConfig> {
        let mut store: StoreConfig = self.get_or_default("store")?;
        store.text = self.get_or_default("text")?;
        Ok(store)
    }
}

/// Settings for one store instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding `records.log` and `terms.log`. Unset means in-memory.
    pub data_dir: Option<String>,
    /// Embedding dimension. Unset means "taken from the first stored document".
    pub dimension: Option<usize>,
    /// k used by `semantic_search` when the caller does not pass one.
    pub default_k: usize,
    /// fsync every journal append before acknowledging.
    pub sync_writes: bool,
    #[serde(skip)]
    pub text: TextConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { data_dir: None, dimension: None, default_k: DEFAULT_K, sync_writes: true, text: TextConfig::default() }
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self { Self::default() }

    pub fn durable(data_dir: impl Into<String>) -> Self {
        Self { data_dir: Some(data_dir.into()), ..Self::default() }
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    /// The configured data directory with `~` and env vars expanded.
    pub fn data_path(&self) -> Option<PathBuf> { self.data_dir.as_deref().map(expand_path) }

    pub fn validate(&self) -> Result<()> {
        if self.default_k == 0 {
            return Err(Error::InvalidConfig("store.default_k must be at least 1".to_string()));
        }
        if self.dimension == Some(0) {
            return Err(Error::InvalidConfig("store.dimension must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Tokenizer settings shared by indexing and querying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Drop common English stop words from both documents and queries.
    pub stop_words: bool,
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
