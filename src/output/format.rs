//! Report encodings and their file extensions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a format name does not name a usable report target.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// The name is not one of the supported formats.
    #[error("invalid output format '{0}' (expected one of: json, stdout, html, sqlite)")]
    Invalid(String),
}

/// Supported report encodings.
///
/// `Invalid` marks an unrecognized name; it is never a valid report target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Machine-readable JSON document
    Json,
    /// Plain text for the terminal
    Stdout,
    /// Self-contained HTML page
    Html,
    /// Copy of the record store
    Sqlite,
    /// Not a recognized format
    Invalid,
}

impl OutputFormat {
    /// Every variant, in declaration order.
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Json,
        OutputFormat::Stdout,
        OutputFormat::Html,
        OutputFormat::Sqlite,
        OutputFormat::Invalid,
    ];

    /// Look up a format by name, ignoring ASCII case.
    ///
    /// Never fails: empty or unknown names give [`OutputFormat::Invalid`].
    ///
    /// # Example
    ///
    /// ```
    /// use drydupe::output::OutputFormat;
    ///
    /// assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
    /// assert_eq!(OutputFormat::parse("yaml"), OutputFormat::Invalid);
    /// ```
    #[must_use]
    pub fn parse(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(name))
            .unwrap_or(Self::Invalid)
    }

    /// Like [`parse`](Self::parse), treating a missing name as invalid.
    #[must_use]
    pub fn parse_optional(name: Option<&str>) -> Self {
        name.map_or(Self::Invalid, Self::parse)
    }

    /// Canonical lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Stdout => "stdout",
            Self::Html => "html",
            Self::Sqlite => "sqlite",
            Self::Invalid => "invalid",
        }
    }

    /// File extension of the report artifact, including the leading dot.
    ///
    /// `Invalid` has no extension: a warning is logged and the empty string
    /// is returned.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => ".json",
            Self::Stdout => ".txt",
            Self::Html => ".htm",
            Self::Sqlite => ".sqlite",
            Self::Invalid => {
                log::warn!("invalid output format has no file extension");
                ""
            }
        }
    }

    /// Whether this is a usable report target.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self != Self::Invalid
    }

    /// Reject [`OutputFormat::Invalid`].
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Invalid`] for the sentinel value.
    pub fn require_valid(self) -> Result<Self, FormatError> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(FormatError::Invalid(self.name().to_string()))
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Strict parsing: unknown names are an error instead of `Invalid`.
impl FromStr for OutputFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::parse(s) {
            Self::Invalid => Err(FormatError::Invalid(s.to_string())),
            format => Ok(format),
        }
    }
}
