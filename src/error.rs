//! Exit codes and machine-readable error reports.

use serde::Serialize;

use crate::duplicates::FinderError;

/// Process exit codes.
///
/// - 0: report written, duplicates found
/// - 1: unexpected failure (store, I/O, configuration, invalid format)
/// - 2: report written, no duplicates
/// - 3: report written, some files could not be read
/// - 130: interrupted by Ctrl+C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NoDuplicates = 2,
    PartialSuccess = 3,
    Interrupted = 130,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable code, e.g. `DD001`.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DD000",
            Self::GeneralError => "DD001",
            Self::NoDuplicates => "DD002",
            Self::PartialSuccess => "DD003",
            Self::Interrupted => "DD130",
        }
    }

    /// Exit code for a failed run.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        let interrupted = err
            .chain()
            .any(|cause| matches!(cause.downcast_ref::<FinderError>(), Some(FinderError::Interrupted)));
        if interrupted {
            Self::Interrupted
        } else {
            Self::GeneralError
        }
    }
}

/// Error report printed with `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// e.g. "DD001"
    pub code: String,
    pub exit_code: i32,
    /// Full cause chain, outermost first
    pub message: String,
    pub interrupted: bool,
}

impl StructuredError {
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_codes() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::NoDuplicates.as_i32(), 2);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
        assert_eq!(ExitCode::PartialSuccess.code_prefix(), "DD003");
    }

    #[test]
    fn test_interrupted_is_found_through_context() {
        let err = Err::<(), _>(FinderError::Interrupted)
            .context("scan failed")
            .unwrap_err();
        assert_eq!(ExitCode::for_error(&err), ExitCode::Interrupted);
        assert_eq!(
            ExitCode::for_error(&anyhow::anyhow!("disk full")),
            ExitCode::GeneralError
        );
    }

    #[test]
    fn test_structured_error_json() {
        let err = anyhow::anyhow!("inner").context("outer");
        let structured = StructuredError::new(&err, ExitCode::GeneralError);
        let json = serde_json::to_value(&structured).unwrap();
        assert_eq!(json["code"], "DD001");
        assert_eq!(json["exit_code"], 1);
        assert_eq!(json["message"], "outer: inner");
        assert_eq!(json["interrupted"], false);
    }
}
