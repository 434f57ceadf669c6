//! Process configuration, read once at startup.
//!
//! The API key and the login credentials come from the environment (usually
//! via a `.env` file). Model names and retrieval knobs come from the CLI and
//! are written onto [`Settings`] by `main`.

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::Path;

use tracing::debug;

use crate::answerer::CombineStrategy;
use crate::constants::{
    DEFAULT_API_BASE, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, DEFAULT_TOP_K, ENV_API_KEY,
    ENV_PASSWORD, ENV_USER,
};
use crate::error::{ChatError, ChatResult};

/// Expected login for the chat surface.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Returns `None` when either value is empty, so an unset variable can
    /// never turn into an empty-string login.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Option<Self> {
        let username = username.into();
        let password = password.into();
        if username.is_empty() || password.is_empty() {
            return None;
        }
        Some(Self { username, password })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct Settings {
    api_key: String,
    pub credentials: Option<Credentials>,
    pub api_base: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub top_k: NonZeroUsize,
    pub combine: CombineStrategy,
}

impl Settings {
    /// Builds settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> ChatResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY)
            .filter(|key| !key.is_empty())
            .ok_or(ChatError::MissingSetting(ENV_API_KEY))?;

        let credentials = match (lookup(ENV_USER), lookup(ENV_PASSWORD)) {
            (Some(user), Some(password)) => Credentials::new(user, password),
            _ => None,
        };
        debug!(
            has_credentials = credentials.is_some(),
            "Loaded settings from environment"
        );

        Ok(Self {
            api_key,
            credentials,
            api_base: DEFAULT_API_BASE.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            top_k: DEFAULT_TOP_K,
            combine: CombineStrategy::default(),
        })
    }

    /// Reads the process environment, falling back to values from a dotenv
    /// file. A missing file is not an error.
    pub fn load(env_file: impl AsRef<Path>) -> ChatResult<Self> {
        Self::layered(env_file.as_ref(), |key| std::env::var(key).ok())
    }

    // Values from `env` win over the file, as with `dotenvy::from_path`.
    fn layered<F>(env_file: &Path, env: F) -> ChatResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_vars = match dotenvy::from_path_iter(env_file) {
            Ok(iter) => iter.collect::<Result<HashMap<String, String>, _>>()?,
            Err(e) if e.not_found() => {
                debug!(path = %env_file.display(), "No env file, using process environment");
                HashMap::new()
            }
            Err(e) => return Err(e.into()),
        };
        Self::from_lookup(|key| env(key).or_else(|| file_vars.get(key).cloned()))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("credentials", &self.credentials)
            .field("api_base", &self.api_base)
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("top_k", &self.top_k)
            .field("combine", &self.combine)
            .finish()
    }
}
