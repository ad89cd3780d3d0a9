use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ExchangeError, Result};

/// Length of the tokens accepted on the interactive channel.
pub const CREDENTIAL_LEN: usize = 32;

/// Opaque session identifier of one party.
///
/// Never empty: the empty string is reserved as the failure value of
/// [`crate::CredentialExchanger::run_or_empty`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(ExchangeError::InvalidCredential(
                "credential must not be empty".to_owned(),
            ));
        }
        Ok(Self(value))
    }

    /// Fresh random token of [`CREDENTIAL_LEN`] hex characters.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether the token has the shape expected on the interactive channel.
    pub fn is_interactive_token(value: &str) -> bool {
        value.chars().count() == CREDENTIAL_LEN
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Credential {
    type Error = ExchangeError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Credential> for String {
    fn from(value: Credential) -> Self {
        value.0
    }
}

/// Which side of the handshake this process plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Writes first, then waits for `client_id`.
    Server,
    /// Waits for a fresh `server_id`, then writes `client_id`.
    Client,
}

impl Role {
    /// `join = true` is the joining (client) side.
    pub fn from_join(join: bool) -> Self {
        if join {
            Role::Client
        } else {
            Role::Server
        }
    }

    pub fn is_join(self) -> bool {
        self == Role::Client
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Server => f.write_str("server"),
            Role::Client => f.write_str("client"),
        }
    }
}
