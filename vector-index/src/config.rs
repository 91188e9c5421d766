//! Settings for vector index backends.
//!
//! [`Settings`] describes which storage providers exist (keyed by alias) and
//! optionally overrides the system prompt used by
//! [`VectorIndex::query`](crate::VectorIndex::query). It is usually loaded
//! from a TOML file:
//!
//! ```toml
//! query_prompt = "Answer in one sentence."
//!
//! [storage_providers.default]
//! provider = "pgvector"
//! url = "postgres://localhost/vectors"
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, VectorIndexError};

/// Environment variable that overrides [`Settings::query_prompt`].
pub const QUERY_PROMPT_ENV: &str = "VECTOR_INDEX_QUERY_PROMPT";

/// Configuration for a single storage provider alias.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageProviderSettings {
    /// Name of the provider kind, as registered with
    /// [`BackendsBuilder::storage_provider_kind`](crate::BackendsBuilder::storage_provider_kind).
    pub provider: String,
    /// Provider-specific keys, passed to the provider's typed configuration.
    #[serde(flatten)]
    pub config: Map<String, Value>,
}

/// Top-level vector index settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Replaces the default system prompt used when answering queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_prompt: Option<String>,
    /// Storage provider configurations keyed by alias.
    #[serde(default)]
    pub storage_providers: HashMap<String, StorageProviderSettings>,
}

impl Settings {
    /// Create a new builder for constructing [`Settings`].
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Parse settings from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`VectorIndexError::Settings`] on malformed TOML and
    /// [`VectorIndexError::Config`] if validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`VectorIndexError::Io`] if the file cannot be read, otherwise
    /// the same errors as [`from_toml_str`](Settings::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Ok(Self::from_toml_str(&content)?.with_env_overrides())
    }

    /// Apply [`QUERY_PROMPT_ENV`] if it is set to a non-empty value.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(prompt) = std::env::var(QUERY_PROMPT_ENV) {
            if !prompt.trim().is_empty() {
                self.query_prompt = Some(prompt);
            }
        }
        self
    }

    /// Check that the settings are internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`VectorIndexError::Config`] if an alias or provider kind is
    /// empty, or the query prompt is blank.
    pub fn validate(&self) -> Result<()> {
        if let Some(prompt) = &self.query_prompt {
            if prompt.trim().is_empty() {
                return Err(VectorIndexError::Config("query_prompt must not be blank".to_string()));
            }
        }
        for (alias, provider) in &self.storage_providers {
            if alias.trim().is_empty() {
                return Err(VectorIndexError::Config(
                    "storage provider alias must not be empty".to_string(),
                ));
            }
            if provider.provider.trim().is_empty() {
                return Err(VectorIndexError::Config(format!(
                    "storage provider '{alias}' does not name a provider kind"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for constructing validated [`Settings`].
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    /// Override the default query system prompt.
    pub fn query_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.settings.query_prompt = Some(prompt.into());
        self
    }

    /// Configure a storage provider alias.
    pub fn storage_provider(
        mut self,
        alias: impl Into<String>,
        provider: impl Into<String>,
        config: Map<String, Value>,
    ) -> Self {
        self.settings
            .storage_providers
            .insert(alias.into(), StorageProviderSettings { provider: provider.into(), config });
        self
    }

    /// Build the [`Settings`], validating them.
    ///
    /// # Errors
    ///
    /// See [`Settings::validate`].
    pub fn build(self) -> Result<Settings> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}
