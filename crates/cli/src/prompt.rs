//! Interactive prompts on stdin. Prompt text goes to stderr.

use std::io::{self, BufRead, Write};

use secrecy::SecretString;

/// Read one trimmed line after showing `prompt`.
///
/// # Errors
///
/// Returns an error if stdin cannot be read.
pub fn line(prompt: &str) -> io::Result<String> {
    let mut stderr = io::stderr().lock();
    write!(stderr, "{prompt} ")?;
    stderr.flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Read a password. Input is echoed; pipe it in for scripted use.
///
/// # Errors
///
/// Returns an error if stdin cannot be read.
pub fn secret(prompt: &str) -> io::Result<SecretString> {
    line(prompt).map(SecretString::from)
}

/// `y`/`yes` confirms; anything else, including read errors, declines.
#[must_use]
pub fn confirm(prompt: &str) -> bool {
    line(&format!("{prompt} [y/N]"))
        .is_ok_and(|answer| matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

/// Use the given password or ask for one.
///
/// # Errors
///
/// Returns an error if stdin cannot be read.
pub fn password_or_prompt(password: Option<String>, prompt: &str) -> io::Result<SecretString> {
    match password {
        Some(password) => Ok(SecretString::from(password)),
        None => secret(prompt),
    }
}
