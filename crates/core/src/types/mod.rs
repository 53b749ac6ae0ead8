//! Core types for Zone7.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use credential::{
    MIN_PASSWORD_LENGTH, PasswordError, Username, UsernameError, validate_login_password,
    validate_new_password,
};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price, apply_discount};
pub use status::OrderStatus;
