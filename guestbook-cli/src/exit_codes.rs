//! Exit codes following sysexits.h conventions.
//!
//! These codes provide semantic meaning for different failure modes,
//! enabling scripts to tell a bad input apart from an unreachable server.

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments, bad server URL).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data format error (not an image, upload rejected).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Guestbook server unreachable.
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const NETWORK_ERROR: i32 = 69;

/// Local state file cannot be read or written.
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// The server refused the operation for this visitor.
/// Maps to EX_NOPERM from sysexits.h.
pub const PERMISSION_DENIED: i32 = 77;

/// Shown under `--help`.
pub const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage error (invalid arguments or server URL)
  65  Data error (not an image, upload rejected)
  66  Input file not found
  69  Server unavailable
  74  State file I/O error
  77  Permission denied (deleting another visitor's photo)";

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        // Classify error by inspecting the chain
        let code = if message.contains("Failed to read file") {
            INPUT_ERROR
        } else if message.contains("Delete rejected") {
            PERMISSION_DENIED
        } else if message.contains("Upload rejected")
            || message.contains("Compression failed")
            || message.contains("Failed to decode image")
        {
            DATA_ERROR
        } else if message.contains("Network error")
            || message.contains("Connection failed")
            || message.contains("Malformed response")
        {
            NETWORK_ERROR
        } else if message.contains("Storage error") {
            IO_ERROR
        } else if message.contains("Configuration error") {
            USAGE_ERROR
        } else {
            GENERAL_ERROR
        };

        Self {
            code,
            message: Some(message),
        }
    }
}
