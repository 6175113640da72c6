// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates hauler.yml template files.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{HostSpec, ImageRef};

use super::{CONFIG_FILENAME, Config};

pub fn init_config(
    dir: &Path,
    host: Option<&str>,
    source: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();

    if let Some(h) = host {
        HostSpec::parse(h).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.host = h.to_string();
    }

    if let Some(s) = source {
        config.source =
            Some(ImageRef::parse(s).map_err(|e| Error::InvalidConfig(e.to_string()))?);
    }

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    format!(
        r#"source: {}
host: {}
# Destination name and tag (default: same as source)
# image: registry.internal/my-app
# tag: v1
compare_checksum: {}
override_existing: {}
# SSH host key verification (default: true, Trust-On-First-Use)
# Set to false to require a pre-populated ~/.ssh/known_hosts
# trust_first_connection: false
# timeout: 30m
"#,
        config
            .source
            .as_ref()
            .map(ImageRef::full_name)
            .unwrap_or_else(|| "my-app:latest".to_string()),
        config.host,
        config.compare_checksum,
        config.override_existing,
    )
}
