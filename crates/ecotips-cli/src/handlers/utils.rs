//! Shared utilities for command handlers

use crate::error::{Error, Result};
use std::io::{self, BufRead, Read, Write};
use std::path::Path;

/// Whether the input argument means stdin
pub fn reads_stdin(input: Option<&Path>) -> bool {
    match input {
        None => true,
        Some(path) => path.as_os_str() == "-",
    }
}

/// Read the readings text from a file or stdin
pub fn read_input(input: Option<&Path>) -> Result<String> {
    if reads_stdin(input) {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        tracing::debug!(bytes = text.len(), "Read input from stdin");
        return Ok(text);
    }

    // reads_stdin covers None
    let path = input.ok_or_else(|| Error::other("No input given"))?;
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let text = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "Read input file");
    Ok(text)
}

/// Ask a yes/no question; anything but `y`/`yes` is a no
pub fn confirm(question: &str, input: &mut impl BufRead, output: &mut impl Write) -> Result<bool> {
    write!(output, "{} [y/N] ", question)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "はい")
}
