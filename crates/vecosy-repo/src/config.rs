use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vecosy_merge::DocumentFormat;

use crate::error::{RepoError, RepoResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Require a signed token on every request.
    pub security_enabled: bool,
    /// Fetch from upstream every this many seconds; `None` disables
    /// periodic fetching.
    pub fetch_interval_secs: Option<u64>,
    /// Maximum number of cached application public keys.
    pub key_cache_capacity: usize,
    /// Path of the public key file inside a snapshot.
    pub public_key_path: String,
    /// Extension of the files the merge strategies look for.
    pub merge_extension: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            security_enabled: true,
            fetch_interval_secs: None,
            key_cache_capacity: 1024,
            public_key_path: "pub.key".into(),
            merge_extension: "yml".into(),
        }
    }
}

impl RepoConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> RepoResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| RepoError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> RepoResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| RepoError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> RepoResult<()> {
        if self.key_cache_capacity == 0 {
            return Err(RepoError::Config("key_cache_capacity must be at least 1".into()));
        }
        if self.fetch_interval_secs == Some(0) {
            return Err(RepoError::Config("fetch_interval_secs must be greater than zero".into()));
        }
        if self.public_key_path.trim().is_empty() {
            return Err(RepoError::Config("public_key_path must not be empty".into()));
        }
        if DocumentFormat::from_extension(&self.merge_extension).is_none() {
            return Err(RepoError::Config(format!(
                "unsupported merge_extension {:?}",
                self.merge_extension
            )));
        }
        Ok(())
    }

    pub fn fetch_interval(&self) -> Option<Duration> {
        self.fetch_interval_secs.map(Duration::from_secs)
    }

    pub(crate) fn cache_capacity(&self) -> RepoResult<NonZeroUsize> {
        NonZeroUsize::new(self.key_cache_capacity)
            .ok_or_else(|| RepoError::Config("key_cache_capacity must be at least 1".into()))
    }
}
