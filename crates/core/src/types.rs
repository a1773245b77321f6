use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Opaque handle naming a stored file on the gateway.
///
/// Used both for the uploaded video (`video_fid`) and for the converted
/// audio (`mp3_fid`). The value is never parsed or rewritten; the only
/// invariant is that it is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactId(String);

impl ArtifactId {
    pub fn new(value: impl Into<String>) -> Result<Self, CoreError> {
        let value = value.into();
        if value.is_empty() {
            return Err(CoreError::Validation(
                "artifact identifier must not be empty".into(),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ArtifactId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ArtifactId> for String {
    fn from(id: ArtifactId) -> Self {
        id.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bearer credential returned by `/login`.
///
/// Kept byte-for-byte as the gateway sent it. `Debug` only shows a short
/// hint so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

/// Number of leading characters shown by [`BearerToken::hint`].
const TOKEN_HINT_LEN: usize = 4;

impl BearerToken {
    pub fn new(value: impl Into<String>) -> Result<Self, CoreError> {
        let value = value.into();
        if value.is_empty() {
            return Err(CoreError::Validation("bearer token must not be empty".into()));
        }
        Ok(Self(value))
    }

    /// The raw token, for building the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Short, non-secret prefix for display, e.g. `eyJh...`.
    pub fn hint(&self) -> String {
        let prefix: String = self.0.chars().take(TOKEN_HINT_LEN).collect();
        format!("{prefix}...")
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BearerToken").field(&self.hint()).finish()
    }
}

/// Username/secret pair sent as HTTP basic auth to `/login`.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}
