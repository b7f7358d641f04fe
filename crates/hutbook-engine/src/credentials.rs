use std::fmt;
use thiserror::Error;

pub const USERNAME_VAR: &str = "HUT_USERNAME";
pub const PASSWORD_VAR: &str = "HUT_PASSWORD";

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("HUT_USERNAME and HUT_PASSWORD must be set (environment or .env)")]
    Missing,
}

/// Account used to log in to the reservation site.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read `HUT_USERNAME`/`HUT_PASSWORD`, loading a `.env` file first when
    /// one exists.
    pub fn from_env() -> Result<Self, CredentialsError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, CredentialsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = lookup(USERNAME_VAR).filter(|v| !v.trim().is_empty());
        let password = lookup(PASSWORD_VAR).filter(|v| !v.is_empty());
        match (username, password) {
            (Some(username), Some(password)) => Ok(Self::new(username.trim(), password)),
            _ => Err(CredentialsError::Missing),
        }
    }
}
