//! Wire model of the document-analysis API.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Bearer token issued by the auth API.
pub struct AuthToken(SecretString);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Stored tokens that are empty are treated as absent.
    pub fn is_blank(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

/// Value of the `edit_mode` multipart field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditMode(String);

impl EditMode {
    pub const MINIMAL: &'static str = "minimal";

    pub fn new(mode: impl Into<String>) -> Self {
        Self(mode.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EditMode {
    fn default() -> Self {
        Self(Self::MINIMAL.to_string())
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single spelling/grammar fix, in the order the backend reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub original: String,
    pub corrected: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Figure {
    /// Backends send either numeric or string ids.
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    /// URL of the extracted figure image.
    pub image: String,
    /// Commentary with embedded newlines.
    #[serde(default)]
    pub analysis: String,
}

/// Output of `POST /api/upload`. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub session_id: String,
    #[serde(default)]
    pub original_text: String,
    /// HTML-bearing string produced by the backend.
    #[serde(default)]
    pub corrected_text: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub corrections: Vec<Correction>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub figures: Vec<Figure>,
}

impl AnalysisResult {
    pub fn has_corrections(&self) -> bool {
        !self.corrections.is_empty()
    }

    pub fn has_figures(&self) -> bool {
        !self.figures.is_empty()
    }

    /// A result without a session id cannot back a conversation.
    pub fn chat_session(&self) -> Option<&str> {
        let id = self.session_id.trim();
        (!id.is_empty()).then_some(id)
    }
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Float(n) => n.to_string(),
    })
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
