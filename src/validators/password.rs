use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Password rules applied when a password is set or reset.
///
/// Rules are checked in a fixed order (length, uppercase, lowercase, digit,
/// special) and only the first violation is reported.
///
/// ```
/// use rdx_dash::validators::{PasswordPolicy, ValidationError};
///
/// let policy = PasswordPolicy::default();
/// assert!(policy.validate("Abcdef1!").is_ok());
/// assert_eq!(
///     policy.validate("Abcdefg1").unwrap_err(),
///     ValidationError::PasswordMissingSpecial
/// );
/// ```
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordPolicy {
    /// Minimum length in characters (default: 6)
    pub min_length: usize,
    /// Optional upper bound on length (default: none)
    pub max_length: Option<usize>,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    /// At least one of `!@#$%^&*(),.?":{}|<>`
    pub require_special: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 6,
            max_length: None,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

impl PasswordPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Length rules only, no character classes.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            require_uppercase: false,
            require_lowercase: false,
            require_digit: false,
            require_special: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn min(mut self, len: usize) -> Self {
        self.min_length = len;
        self
    }

    #[must_use]
    pub fn max(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    /// Validates a password against this policy.
    ///
    /// # Errors
    ///
    /// Returns the first rule the password violates.
    pub fn validate(&self, password: &str) -> Result<(), ValidationError> {
        let length = password.chars().count();

        if length < self.min_length {
            return Err(ValidationError::PasswordTooShort(self.min_length));
        }

        if let Some(max) = self.max_length.filter(|max| length > *max) {
            return Err(ValidationError::PasswordTooLong(max));
        }

        if self.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::PasswordMissingUppercase);
        }

        if self.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(ValidationError::PasswordMissingLowercase);
        }

        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(ValidationError::PasswordMissingDigit);
        }

        if self.require_special && !password.chars().any(is_special_char) {
            return Err(ValidationError::PasswordMissingSpecial);
        }

        Ok(())
    }
}

fn is_special_char(c: char) -> bool {
    matches!(
        c,
        '!' | '@'
            | '#'
            | '$'
            | '%'
            | '^'
            | '&'
            | '*'
            | '('
            | ')'
            | ','
            | '.'
            | '?'
            | '"'
            | ':'
            | '{'
            | '}'
            | '|'
            | '<'
            | '>'
    )
}

/// Validates a password using the default policy.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    PasswordPolicy::default().validate(password)
}
