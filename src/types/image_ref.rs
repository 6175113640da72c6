// ABOUTME: Container image reference as a name/tag pair.
// ABOUTME: Parses "name[:tag]" and renders the canonical "name:tag" form.

use std::fmt;
use thiserror::Error;

pub const DEFAULT_TAG: &str = "latest";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseImageRefError {
    #[error("image name cannot be empty")]
    EmptyName,

    #[error("image tag cannot be empty")]
    EmptyTag,

    #[error("invalid character in image reference: {0}")]
    InvalidChar(char),

    #[error("invalid character in image tag {tag:?}: {ch}")]
    InvalidTagChar { tag: String, ch: char },

    #[error("digest references are not supported: {0}")]
    Digest(String),
}

/// An image identity on an engine: repository name plus tag.
///
/// The name may carry a registry host (and port), e.g.
/// `registry.internal:5000/team/app`. The tag never contains `:` or `/`, which
/// keeps [`ImageRef::full_name`] injective over `(name, tag)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    name: String,
    tag: String,
}

impl ImageRef {
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Result<Self, ParseImageRefError> {
        let name = name.into();
        let tag = tag.into();
        validate_name(&name)?;
        validate_tag(&tag)?;
        Ok(Self { name, tag })
    }

    /// Parse `name[:tag]`, defaulting the tag to `latest`.
    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if input.contains('@') {
            return Err(ParseImageRefError::Digest(input.to_string()));
        }

        // A colon whose suffix contains '/' belongs to a registry port.
        match input.rsplit_once(':') {
            Some((name, tag)) if !tag.contains('/') => Self::new(name, tag),
            _ => Self::new(input, DEFAULT_TAG),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Canonical `name:tag` string used for every engine call.
    pub fn full_name(&self) -> String {
        format!("{}:{}", self.name, self.tag)
    }

    /// Derive a destination reference, replacing the name and/or tag when given.
    pub fn with_overrides(
        &self,
        name: Option<&str>,
        tag: Option<&str>,
    ) -> Result<Self, ParseImageRefError> {
        let (name, tag) = self.override_parts(name, tag);
        Self::new(name, tag)
    }

    /// The name and tag `with_overrides` would use. Empty overrides keep
    /// this reference's parts.
    pub fn override_parts<'a>(
        &'a self,
        name: Option<&'a str>,
        tag: Option<&'a str>,
    ) -> (&'a str, &'a str) {
        (
            name.filter(|n| !n.is_empty()).unwrap_or(&self.name),
            tag.filter(|t| !t.is_empty()).unwrap_or(&self.tag),
        )
    }
}

fn validate_name(name: &str) -> Result<(), ParseImageRefError> {
    if name.is_empty() {
        return Err(ParseImageRefError::EmptyName);
    }
    match name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '-' | '_')))
    {
        Some(c) => Err(ParseImageRefError::InvalidChar(c)),
        None => Ok(()),
    }
}

fn validate_tag(tag: &str) -> Result<(), ParseImageRefError> {
    if tag.is_empty() {
        return Err(ParseImageRefError::EmptyTag);
    }
    match tag
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
    {
        Some(ch) => Err(ParseImageRefError::InvalidTagChar {
            tag: tag.to_string(),
            ch,
        }),
        None => Ok(()),
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.tag)
    }
}

impl std::str::FromStr for ImageRef {
    type Err = ParseImageRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
