//! Exit codes for the scrub CLI.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User/input errors (recoverable by user action)
//! - 20-29: Runtime failures

/// Exit codes for scrub operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Clean = 0,

    // ========================================================================
    // User / Input Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Config could not be found, parsed, resolved or compiled
    ConfigError = 11,

    /// Input recording is malformed, unsupported or empty
    InputError = 12,

    // ========================================================================
    // Runtime Failures (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Runtime failures (codes 20-29) rather than user or input errors.
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InputError => "ERR_INPUT",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
