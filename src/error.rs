//! Crate-level error type (spec §7 promotes exactly one case to `Result`:
//! the ~1 GiB buffer-growth cap).
//!
//! The teacher carries no `thiserror`/`anyhow` dependency and implements
//! `Display`/`Error` by hand throughout (`examples/kivikakk-comrak` has no
//! error-derive crate in its `Cargo.toml`), so this does the same.

use std::fmt;

#[derive(Debug)]
pub enum CmarkError {
    /// A single parse fed more input than `strings::MAX_BUFFER_SIZE` bytes.
    BufferTooLarge { requested: usize },
    Utf8(std::str::Utf8Error),
    Io(std::io::Error),
}

impl fmt::Display for CmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CmarkError::BufferTooLarge { requested } => write!(
                f,
                "input buffer of {} bytes exceeds the {} byte limit",
                requested,
                crate::strings::MAX_BUFFER_SIZE
            ),
            CmarkError::Utf8(e) => write!(f, "invalid UTF-8: {}", e),
            CmarkError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CmarkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CmarkError::BufferTooLarge { .. } => None,
            CmarkError::Utf8(e) => Some(e),
            CmarkError::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for CmarkError {
    fn from(e: std::io::Error) -> Self {
        CmarkError::Io(e)
    }
}

impl From<std::str::Utf8Error> for CmarkError {
    fn from(e: std::str::Utf8Error) -> Self {
        CmarkError::Utf8(e)
    }
}
