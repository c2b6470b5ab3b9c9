//! Sign-in credentials: email addresses and one-time verification codes.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty (after trimming).
    #[error("email cannot be empty")]
    Empty,
    /// The input is longer than RFC 5321 allows.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input is not of the form `local@domain`.
    #[error("email must look like name@domain")]
    Malformed,
}

/// A trimmed email address used as a login identifier.
///
/// Case is kept as typed; the backend decides whether it matters.
///
/// ```
/// use bitebox_core::Email;
///
/// let email = Email::parse("  Ada@Example.com ").unwrap();
/// assert_eq!(email.as_str(), "Ada@Example.com");
/// assert!(Email::parse("no-at-symbol").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, or lacks a
    /// non-empty local part and domain around a single `@`.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        match s.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(s.to_string()))
            }
            _ => Err(EmailError::Malformed),
        }
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Errors produced when a verification code has the wrong shape.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    /// Wrong number of characters.
    #[error("verification code must be exactly {expected} digits (got {actual})")]
    WrongLength {
        /// Required number of digits.
        expected: usize,
        /// Number of characters supplied.
        actual: usize,
    },
    /// Contains something other than ASCII digits.
    #[error("verification code must contain digits only")]
    NonDigit,
}

/// A six-digit one-time verification code sent after signup.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OtpCode(String);

impl OtpCode {
    /// Number of digits in a code.
    pub const LENGTH: usize = 6;

    /// Validate a user-entered code. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError`] describing why the code is malformed.
    pub fn parse(s: &str) -> Result<Self, OtpError> {
        let s = s.trim();
        let actual = s.chars().count();
        if actual != Self::LENGTH {
            return Err(OtpError::WrongLength {
                expected: Self::LENGTH,
                actual,
            });
        }
        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(OtpError::NonDigit);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode([REDACTED])")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_trimmed_but_keeps_case() {
        let email = Email::parse(" Rider@Bitebox.NG ").unwrap();
        assert_eq!(email.as_str(), "Rider@Bitebox.NG");
    }

    #[test]
    fn test_email_rejects_bad_shapes() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("@domain.com"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("user@"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("a@b@c"), Err(EmailError::Malformed));
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(Email::parse(&long), Err(EmailError::TooLong { .. })));
    }

    #[test]
    fn test_otp_accepts_six_digits() {
        let code = OtpCode::parse(" 042917 ").unwrap();
        assert_eq!(code.as_str(), "042917");
    }

    #[test]
    fn test_otp_rejects_wrong_length() {
        assert_eq!(
            OtpCode::parse("12345"),
            Err(OtpError::WrongLength {
                expected: 6,
                actual: 5
            })
        );
        assert!(matches!(
            OtpCode::parse("1234567"),
            Err(OtpError::WrongLength { actual: 7, .. })
        ));
    }

    #[test]
    fn test_otp_rejects_letters() {
        assert_eq!(OtpCode::parse("12a456"), Err(OtpError::NonDigit));
    }

    #[test]
    fn test_otp_debug_is_redacted() {
        let code = OtpCode::parse("123456").unwrap();
        assert!(!format!("{code:?}").contains("123456"));
    }
}
