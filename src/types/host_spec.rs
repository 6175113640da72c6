// ABOUTME: SSH connection string for the remote engine host.
// ABOUTME: Parses "ssh://[user@]host[:port]" and rejects every other scheme.

use std::fmt;
use thiserror::Error;

pub const SSH_SCHEME: &str = "ssh";
pub const DEFAULT_SSH_PORT: u16 = 22;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostSpecError {
    #[error("host cannot be empty")]
    Empty,

    #[error("host {0:?} is not a URL (expected ssh://[user@]host[:port])")]
    MissingScheme(String),

    #[error("unsupported scheme {0:?} (only ssh is supported)")]
    UnsupportedScheme(String),

    #[error("host {0:?} has an empty user")]
    EmptyUser(String),

    #[error("host {0:?} has no hostname")]
    MissingHost(String),

    #[error("invalid port in {0:?}")]
    InvalidPort(String),

    #[error("host {0:?} must not contain a path")]
    UnexpectedPath(String),
}

/// A parsed `ssh://` connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSpec {
    user: Option<String>,
    host: String,
    port: u16,
}

impl HostSpec {
    pub fn parse(input: &str) -> Result<Self, HostSpecError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(HostSpecError::Empty);
        }

        let (scheme, rest) = input
            .split_once("://")
            .ok_or_else(|| HostSpecError::MissingScheme(input.to_string()))?;
        if !scheme.eq_ignore_ascii_case(SSH_SCHEME) {
            return Err(HostSpecError::UnsupportedScheme(scheme.to_string()));
        }

        // Tolerate a single trailing slash, reject anything path-like.
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        if rest.contains('/') {
            return Err(HostSpecError::UnexpectedPath(input.to_string()));
        }

        let (user, authority) = match rest.rsplit_once('@') {
            Some(("", _)) => return Err(HostSpecError::EmptyUser(input.to_string())),
            Some((user, authority)) => (Some(user.to_string()), authority),
            None => (None, rest),
        };

        let (host, port) = split_host_port(authority, input)?;
        if host.is_empty() {
            return Err(HostSpecError::MissingHost(input.to_string()));
        }

        Ok(Self {
            user,
            host: host.to_string(),
            port,
        })
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// The configured user, else `$USER`, else `root`.
    pub fn user_or_default(&self) -> String {
        self.user
            .clone()
            .unwrap_or_else(|| std::env::var("USER").unwrap_or_else(|_| "root".to_string()))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

fn split_host_port<'a>(authority: &'a str, input: &str) -> Result<(&'a str, u16), HostSpecError> {
    // Bracketed IPv6 literal: [::1]:2222
    if let Some(stripped) = authority.strip_prefix('[') {
        let (host, after) = stripped
            .split_once(']')
            .ok_or_else(|| HostSpecError::MissingHost(input.to_string()))?;
        return match after {
            "" => Ok((host, DEFAULT_SSH_PORT)),
            _ => {
                let port = after
                    .strip_prefix(':')
                    .ok_or_else(|| HostSpecError::InvalidPort(input.to_string()))?;
                Ok((host, parse_port(port, input)?))
            }
        };
    }

    match authority.rsplit_once(':') {
        Some((host, port)) => Ok((host, parse_port(port, input)?)),
        None => Ok((authority, DEFAULT_SSH_PORT)),
    }
}

fn parse_port(port: &str, input: &str) -> Result<u16, HostSpecError> {
    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(HostSpecError::InvalidPort(input.to_string())),
        Ok(p) => Ok(p),
    }
}

impl fmt::Display for HostSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", SSH_SCHEME)?;
        if let Some(ref user) = self.user {
            write!(f, "{}@", user)?;
        }
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl std::str::FromStr for HostSpec {
    type Err = HostSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
