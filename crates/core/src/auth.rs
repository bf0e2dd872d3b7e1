use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};

/// Basic-auth credential derived from a Janky token.
///
/// Janky expects an empty username, so the encoded value is `base64(":" + token)`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    encoded: String,
}

impl Credential {
    pub fn from_token(token: &str) -> Self {
        Self {
            encoded: STANDARD.encode(format!(":{token}")),
        }
    }

    /// Value for the `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("Basic {}", self.encoded)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}
