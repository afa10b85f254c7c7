//! Exit codes of the helmweb binary
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - helm failed or returned output that could not be understood
pub const ERROR: i32 = 1;

/// Validation error - a required option is missing or has an invalid value
pub const VALIDATION_ERROR: i32 = 2;

/// Conflict - the release or chart version already exists
pub const CONFLICT: i32 = 3;

/// Configuration error - invalid repositories file or repository URL
pub const CONFIG_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Timeout - helm did not finish in time and was killed
pub const TIMEOUT: i32 = 6;

/// Unavailable - the helm binary could not be started (sysexits.h EX_UNAVAILABLE)
pub const UNAVAILABLE: i32 = 69;
