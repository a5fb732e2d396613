//! Delivery phone number type.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Accepted local formats: `+2519XXXXXXXX`, `09XXXXXXXX`, `07XXXXXXXX` (mobile)
/// and `011XXXXXX` (Addis Ababa landline).
const PHONE_PATTERN: &str = r"^(?:\+2519\d{8}|09\d{8}|07\d{8}|011\d{6})$";

static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PHONE_PATTERN).expect("phone pattern is a valid regex"));

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneNumberError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input does not match a recognized Ethiopian phone format.
    #[error("please enter a valid Ethiopian phone number")]
    InvalidFormat,
}

/// A phone number the courier can reach.
///
/// ## Constraints
///
/// - Surrounding whitespace is ignored
/// - Must be an Ethiopian mobile number (`+2519…`, `09…`, `07…`) or an
///   Addis Ababa landline (`011…`)
///
/// ## Examples
///
/// ```
/// use shophub_core::PhoneNumber;
///
/// assert!(PhoneNumber::parse("0911223344").is_ok());
/// assert!(PhoneNumber::parse("+251911223344").is_ok());
/// assert!(PhoneNumber::parse("12345").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse a `PhoneNumber` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or does not match one of
    /// the accepted formats.
    pub fn parse(s: &str) -> Result<Self, PhoneNumberError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PhoneNumberError::Empty);
        }
        if !PHONE_REGEX.is_match(s) {
            return Err(PhoneNumberError::InvalidFormat);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
