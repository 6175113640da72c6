// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles image refs and home-relative key paths.

use serde::Deserialize;
use std::path::PathBuf;

use crate::types::ImageRef;

pub fn deserialize_image_ref_option<'de, D>(deserializer: D) -> Result<Option<ImageRef>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    opt.map(|s| ImageRef::parse(&s).map_err(serde::de::Error::custom))
        .transpose()
}

pub fn deserialize_key_path<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.map(|s| expand_home(&s)))
}

/// Expand a leading `~/` using `$HOME`; other paths pass through.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}
