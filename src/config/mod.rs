// ABOUTME: Configuration types and parsing for hauler.yml.
// ABOUTME: Handles YAML parsing, validation, and destination merging.

mod deserialize;
mod init;

pub use init::init_config;

use crate::error::{Error, Result};
use crate::runtime::{RemoteOptions, RuntimeConfig, RuntimeType};
use crate::transfer::{PushRequest, TargetOverrides, TransferPolicy};
use crate::types::{HostSpec, ImageRef};
use deserialize::{deserialize_image_ref_option, deserialize_key_path};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "hauler.yml";
pub const CONFIG_FILENAME_ALT: &str = "hauler.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".hauler/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Local image to send. The `push` command's argument takes precedence.
    #[serde(default, deserialize_with = "deserialize_image_ref_option")]
    pub source: Option<ImageRef>,

    /// `ssh://[user@]host[:port]` of the receiving engine's machine.
    pub host: String,

    /// Destination name; the source's when unset.
    #[serde(default)]
    pub image: Option<String>,

    /// Destination tag; the source's when unset.
    #[serde(default)]
    pub tag: Option<String>,

    #[serde(default)]
    pub override_existing: bool,

    #[serde(default)]
    pub compare_checksum: bool,

    #[serde(default)]
    pub runtime: Option<RuntimeType>,

    #[serde(default)]
    pub socket: Option<String>,

    #[serde(default, deserialize_with = "deserialize_key_path")]
    pub key_path: Option<PathBuf>,

    #[serde(default = "default_trust_first_connection")]
    pub trust_first_connection: bool,

    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,

    #[serde(default)]
    pub destinations: HashMap<String, Destination>,
}

/// Named overrides merged over the base config with `--destination`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Destination {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub tag: Option<String>,

    #[serde(default)]
    pub override_existing: Option<bool>,

    #[serde(default)]
    pub compare_checksum: Option<bool>,

    #[serde(default)]
    pub runtime: Option<RuntimeType>,

    #[serde(default)]
    pub socket: Option<String>,

    #[serde(default, deserialize_with = "deserialize_key_path")]
    pub key_path: Option<PathBuf>,

    #[serde(default)]
    pub trust_first_connection: Option<bool>,

    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

fn default_trust_first_connection() -> bool {
    true
}

impl Config {
    /// Parse and validate.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("loading config from {}", path.display());
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Check everything that can be checked without a network.
    pub fn validate(&self) -> Result<()> {
        self.host_spec()?;

        for (field, value) in [("image", &self.image), ("tag", &self.tag)] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(Error::InvalidConfig(format!("{field} cannot be empty")));
            }
        }

        // Name and tag overrides must form a valid reference on their own.
        let probe = ImageRef::new(
            self.image.as_deref().unwrap_or("image"),
            self.tag.as_deref().unwrap_or(crate::types::DEFAULT_TAG),
        );
        probe.map_err(|e| Error::InvalidConfig(format!("destination reference: {e}")))?;

        if self.socket.is_some() && self.runtime.is_none() {
            return Err(Error::InvalidConfig(
                "socket is set without runtime; set runtime to docker or podman".to_string(),
            ));
        }

        Ok(())
    }

    pub fn for_destination(&self, name: &str) -> Result<Config> {
        let dest = self
            .destinations
            .get(name)
            .ok_or_else(|| Error::UnknownDestination(name.to_string()))?;

        let mut merged = self.clone();

        if let Some(ref host) = dest.host {
            merged.host = host.clone();
        }
        if dest.image.is_some() {
            merged.image = dest.image.clone();
        }
        if dest.tag.is_some() {
            merged.tag = dest.tag.clone();
        }
        if let Some(v) = dest.override_existing {
            merged.override_existing = v;
        }
        if let Some(v) = dest.compare_checksum {
            merged.compare_checksum = v;
        }
        if dest.runtime.is_some() {
            merged.runtime = dest.runtime;
        }
        if dest.socket.is_some() {
            merged.socket = dest.socket.clone();
        }
        if dest.key_path.is_some() {
            merged.key_path = dest.key_path.clone();
        }
        if let Some(v) = dest.trust_first_connection {
            merged.trust_first_connection = v;
        }
        if dest.timeout.is_some() {
            merged.timeout = dest.timeout;
        }

        merged.validate()?;
        Ok(merged)
    }

    pub fn host_spec(&self) -> Result<HostSpec> {
        HostSpec::parse(&self.host)
            .map_err(|e| Error::InvalidConfig(format!("host {:?}: {}", self.host, e)))
    }

    pub fn policy(&self) -> TransferPolicy {
        TransferPolicy {
            override_existing: self.override_existing,
            compare_checksum: self.compare_checksum,
        }
    }

    pub fn remote_options(&self) -> RemoteOptions {
        RemoteOptions {
            runtime: RuntimeConfig {
                runtime: self.runtime,
                socket: self.socket.clone(),
            },
            key_path: self.key_path.clone(),
            trust_first_connection: self.trust_first_connection,
        }
    }

    pub fn target_overrides(&self) -> TargetOverrides {
        TargetOverrides::new(self.image.clone(), self.tag.clone())
    }

    /// Build the push for `source`, or for the configured source when `None`.
    pub fn push_request(&self, source: Option<ImageRef>) -> Result<PushRequest> {
        let source = source
            .or_else(|| self.source.clone())
            .ok_or(Error::MissingSource)?;

        let mut request = PushRequest::new(source, self.host.clone())
            .destination(self.target_overrides())
            .remote(self.remote_options())
            .policy(self.policy());
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        Ok(request)
    }

    /// Defaults for everything but the host.
    pub fn with_host(host: impl Into<String>) -> Self {
        Config {
            source: None,
            host: host.into(),
            image: None,
            tag: None,
            override_existing: false,
            compare_checksum: false,
            runtime: None,
            socket: None,
            key_path: None,
            trust_first_connection: default_trust_first_connection(),
            timeout: None,
            destinations: HashMap::new(),
        }
    }

    pub fn template() -> Self {
        Config {
            source: ImageRef::parse("my-app:latest").ok(),
            compare_checksum: true,
            ..Config::with_host("ssh://deploy@server.example.com")
        }
    }
}
