// src/config/source.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CollectError, Result};
use crate::sources::SourceId;

/// Connection settings for one upstream system.
///
/// Credential fields are all optional here; each adapter asks for the pair it
/// needs and fails with a config error when an enabled source lacks it.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SourceConfig {
    pub enabled: bool,
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl SourceConfig {
    pub fn disabled(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }

    /// Username/password when both are present and non-empty.
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        match (non_empty(&self.username), non_empty(&self.password)) {
            (Some(u), Some(p)) => Some((u, p)),
            _ => None,
        }
    }

    pub fn require_basic_auth(&self, id: SourceId) -> Result<(&str, &str)> {
        self.basic_auth()
            .ok_or_else(|| CollectError::config(id.key(), "username and password are required"))
    }

    pub fn require_token(&self, id: SourceId) -> Result<&str> {
        non_empty(&self.token).ok_or_else(|| CollectError::config(id.key(), "token is required"))
    }

    pub fn require_key_pair(&self, id: SourceId) -> Result<(&str, &str)> {
        match (non_empty(&self.access_key), non_empty(&self.secret_key)) {
            (Some(a), Some(s)) => Ok((a, s)),
            _ => Err(CollectError::config(
                id.key(),
                "access key and secret key are required",
            )),
        }
    }
}

/// Blank counts as missing; a set value is returned untouched.
fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.trim().is_empty())
}

// Secrets never reach the logs; only whether they are set.
impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set = |v: &Option<String>| if non_empty(v).is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("SourceConfig")
            .field("enabled", &self.enabled)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &set(&self.password))
            .field("token", &set(&self.token))
            .field("access_key", &set(&self.access_key))
            .field("secret_key", &set(&self.secret_key))
            .finish()
    }
}
