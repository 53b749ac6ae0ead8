//! Username and password rules for login and registration.

use core::fmt;

use thiserror::Error;

/// Errors produced when validating a [`Username`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsernameError {
    #[error("username must be at least {min} characters")]
    TooShort { min: usize },
    #[error("username must be at most {max} characters")]
    TooLong { max: usize },
}

/// Errors produced when validating a password.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordError {
    #[error("password must be at least {min} characters")]
    TooShort { min: usize },
    #[error(
        "password must contain at least one uppercase letter, one lowercase letter, and one number"
    )]
    MissingCharacterClass,
    #[error("passwords must match")]
    Mismatch,
}

/// A display name chosen at registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Minimum number of characters.
    pub const MIN_LENGTH: usize = 3;
    /// Maximum number of characters.
    pub const MAX_LENGTH: usize = 20;

    /// Parse a username, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error when the trimmed length is outside 3..=20 characters.
    pub fn parse(s: &str) -> Result<Self, UsernameError> {
        let s = s.trim();
        let len = s.chars().count();
        if len < Self::MIN_LENGTH {
            return Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }
        if len > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Minimum password length accepted anywhere.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Check a password typed into the login form.
///
/// Login only enforces the minimum length; the backend decides whether the
/// credentials are correct.
///
/// # Errors
///
/// Returns [`PasswordError::TooShort`] for passwords under six characters.
pub fn validate_login_password(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// Check a new password and its confirmation at registration.
///
/// # Errors
///
/// Returns an error if the password is too short, lacks a lowercase letter,
/// an uppercase letter or a digit, or does not match `confirm`.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), PasswordError> {
    validate_login_password(password)?;

    let has_lower = password.chars().any(char::is_lowercase);
    let has_upper = password.chars().any(char::is_uppercase);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_lower && has_upper && has_digit) {
        return Err(PasswordError::MissingCharacterClass);
    }

    if password != confirm {
        return Err(PasswordError::Mismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_bounds() {
        assert_eq!(
            Username::parse("ab"),
            Err(UsernameError::TooShort { min: 3 })
        );
        assert!(Username::parse("abc").is_ok());
        assert!(Username::parse(&"x".repeat(20)).is_ok());
        assert_eq!(
            Username::parse(&"x".repeat(21)),
            Err(UsernameError::TooLong { max: 20 })
        );
    }

    #[test]
    fn test_username_trims() {
        assert_eq!(Username::parse("  mona  ").map(|u| u.to_string()), Ok("mona".to_string()));
    }

    #[test]
    fn test_login_password_length() {
        assert!(validate_login_password("12345").is_err());
        assert!(validate_login_password("123456").is_ok());
    }

    #[test]
    fn test_new_password_rules() {
        assert_eq!(
            validate_new_password("Ab1", "Ab1"),
            Err(PasswordError::TooShort { min: 6 })
        );
        assert_eq!(
            validate_new_password("abcdef1", "abcdef1"),
            Err(PasswordError::MissingCharacterClass)
        );
        assert_eq!(
            validate_new_password("Abcdef1", "Abcdef2"),
            Err(PasswordError::Mismatch)
        );
        assert_eq!(validate_new_password("Abcdef1", "Abcdef1"), Ok(()));
    }
}
