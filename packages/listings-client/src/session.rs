//! Signed-session authentication.
//!
//! The listings API authenticates every call with a pre-signed OAuth-style
//! authorization header built from a consumer key/secret pair. The session
//! is opaque to callers: construct it once, hand it to the client, and the
//! client attaches the header to each request.

use std::fmt;

use secrecy::{ExposeSecret, SecretBox};

/// A consumer secret held in zeroizing memory.
///
/// Uses `secrecy::SecretBox` so the secret never appears in logs, debug
/// output, or error messages.
struct ConsumerSecret(SecretBox<str>);

impl ConsumerSecret {
    fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for ConsumerSecret {
    fn clone(&self) -> Self {
        Self::new(self.expose().to_string())
    }
}

impl fmt::Debug for ConsumerSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// An opaque signed session for the listings API.
#[derive(Clone)]
pub struct SignedSession {
    consumer_key: String,
    consumer_secret: ConsumerSecret,
}

impl SignedSession {
    /// Create a session from a consumer key/secret pair.
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: ConsumerSecret::new(consumer_secret),
        }
    }

    /// Create from the `LISTINGS_CONSUMER_KEY` / `LISTINGS_CONSUMER_SECRET`
    /// environment variables.
    pub fn from_env() -> Option<Self> {
        let key = std::env::var("LISTINGS_CONSUMER_KEY").ok()?;
        let secret = std::env::var("LISTINGS_CONSUMER_SECRET").ok()?;
        Some(Self::new(key, secret))
    }

    /// The consumer key (public identifier).
    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    /// Render the authorization header value for one request.
    ///
    /// Uses the plaintext signature method the API accepts for
    /// application-level (non-user) calls.
    pub fn authorization_header(&self) -> String {
        format!(
            "OAuth oauth_consumer_key=\"{}\", oauth_signature_method=\"PLAINTEXT\", oauth_signature=\"{}&\"",
            self.consumer_key,
            self.consumer_secret.expose(),
        )
    }
}

impl fmt::Debug for SignedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedSession")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &self.consumer_secret)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_header_format() {
        let session = SignedSession::new("key123", "secret456");
        let header = session.authorization_header();

        assert!(header.starts_with("OAuth "));
        assert!(header.contains("oauth_consumer_key=\"key123\""));
        assert!(header.contains("oauth_signature_method=\"PLAINTEXT\""));
        assert!(header.contains("oauth_signature=\"secret456&\""));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let session = SignedSession::new("key123", "secret456");
        let debug = format!("{:?}", session);

        assert!(debug.contains("key123"));
        assert!(!debug.contains("secret456"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_clone_preserves_secret() {
        let session = SignedSession::new("key123", "secret456");
        let cloned = session.clone();

        assert_eq!(
            session.authorization_header(),
            cloned.authorization_header()
        );
    }
}
