use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies a single solver run in logs and outcomes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RunId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Key of a sub-question inside a batch task, e.g. `"01"`.
///
/// Purely numeric ids are zero-padded to two digits so that `"1"` taken from
/// free-form server text and `"01"` taken from the question file compare equal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref().trim();
        if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
            Self(format!("{:0>2}", raw))
        } else {
            Self(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for QuestionId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

/// Course API key. Serializes as the plain string; `Debug` and `Display`
/// show only a short prefix so the key never lands in logs.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(raw: impl Into<String>) -> crate::Result<Self> {
        let raw = raw.into().trim().to_string();
        if raw.is_empty() {
            return Err(crate::CoreError::Configuration(
                "API key cannot be empty".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    /// The full key, for request bodies and URLs.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn redacted(&self) -> String {
        redact(&self.0)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", self.redacted())
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// Keeps the first four characters of a secret.
pub fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    format!("{}***", prefix)
}
