/// Exit codes for mdnorm, following Ruff's convention
///
/// These exit codes let users and CI/CD systems distinguish "files need
/// normalizing" from tool failures.
/// Success - nothing to change, or every change was written
pub const SUCCESS: i32 = 0;

/// Check mode found files that are not normalized
pub const NOT_NORMALIZED: i32 = 1;

/// Tool error - configuration error, file access error, or internal error
pub const TOOL_ERROR: i32 = 2;

/// Helper functions for consistent exit behavior
pub mod exit {
    use super::{NOT_NORMALIZED, SUCCESS, TOOL_ERROR};

    /// Exit with success code (0)
    pub fn success() -> ! {
        std::process::exit(SUCCESS);
    }

    /// Exit with the not-normalized code (1)
    pub fn not_normalized() -> ! {
        std::process::exit(NOT_NORMALIZED);
    }

    /// Exit with tool error code (2)
    pub fn tool_error() -> ! {
        std::process::exit(TOOL_ERROR);
    }
}
