//! Printing command results.

use serde::Serialize;

/// Print a value as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
#[allow(clippy::print_stdout)]
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a one-line message on stdout.
#[allow(clippy::print_stdout)]
pub fn print_message(message: &str) {
    println!("{message}");
}
