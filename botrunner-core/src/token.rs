//! Bot authentication token
//!
//! The token is held in a [`SecretString`] so it never shows up in
//! `Debug` output, logs, or status reports. Call [`BotToken::expose_secret`]
//! only when writing it to the wire.

use secrecy::{ExposeSecret, SecretString};

use crate::error::LifecycleError;

/// Minimum accepted length of a bot token
pub const DEFAULT_MIN_TOKEN_LENGTH: usize = 50;

/// Opaque bot credential
#[derive(Clone)]
pub struct BotToken(SecretString);

impl BotToken {
    /// Validate the format of a raw token
    ///
    /// Surrounding whitespace is dropped. Empty input or input shorter than
    /// `min_length` characters is rejected without contacting the service.
    pub fn parse(raw: &str, min_length: usize) -> Result<Self, LifecycleError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().count() < min_length {
            return Err(LifecycleError::InvalidToken);
        }
        Ok(Self(SecretString::from(trimmed.to_string())))
    }

    /// Expose the raw token; use only when sending it to the service
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }

    /// Value of the HTTP `Authorization` header
    pub fn authorization(&self) -> String {
        format!("Bot {}", self.expose_secret())
    }
}

impl std::fmt::Debug for BotToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BotToken([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "MTA5ODc2NTQzMjEwOTg3NjU0.GxYzAb.abcdefghijklmnopqrstuvwxyz0123456789";

    #[test]
    fn parse_accepts_long_tokens() {
        let token = BotToken::parse(RAW, DEFAULT_MIN_TOKEN_LENGTH).unwrap();
        assert_eq!(token.expose_secret(), RAW);
        assert_eq!(token.authorization(), format!("Bot {}", RAW));
    }

    #[test]
    fn parse_trims_whitespace() {
        let token = BotToken::parse(&format!("  {}\n", RAW), DEFAULT_MIN_TOKEN_LENGTH).unwrap();
        assert_eq!(token.expose_secret(), RAW);
    }

    #[test]
    fn parse_rejects_empty_and_short() {
        assert_eq!(
            BotToken::parse("", DEFAULT_MIN_TOKEN_LENGTH).unwrap_err(),
            LifecycleError::InvalidToken
        );
        assert_eq!(
            BotToken::parse("   ", DEFAULT_MIN_TOKEN_LENGTH).unwrap_err(),
            LifecycleError::InvalidToken
        );
        assert_eq!(
            BotToken::parse("abc123", DEFAULT_MIN_TOKEN_LENGTH).unwrap_err(),
            LifecycleError::InvalidToken
        );
        let forty_nine = "x".repeat(49);
        assert!(BotToken::parse(&forty_nine, DEFAULT_MIN_TOKEN_LENGTH).is_err());
        assert!(BotToken::parse(&format!("{}x", forty_nine), DEFAULT_MIN_TOKEN_LENGTH).is_ok());
    }

    #[test]
    fn debug_is_redacted() {
        let token = BotToken::parse(RAW, DEFAULT_MIN_TOKEN_LENGTH).unwrap();
        let debug = format!("{:?}", token);
        assert_eq!(debug, "BotToken([REDACTED])");
        assert!(!debug.contains("GxYzAb"));
    }
}
