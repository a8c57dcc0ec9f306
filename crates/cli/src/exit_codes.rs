//! CLI Exit Code Registry
//!
//! Single source of truth for `shiftrev` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                             |
//! |------|-----------------------------------------------------|
//! | 0    | Success                                             |
//! | 1    | General error (unspecified)                         |
//! | 2    | Usage error (bad args, missing input path)          |
//! | 3    | Invalid config (TOML parse or validation failure)   |
//! | 4    | Runtime error (unreadable file, missing column)     |
//! | 5    | Data-quality issues present and `--strict` was set  |

use shiftrev_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config could not be parsed or failed validation.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 3;

/// I/O failure or a source table missing a mapped column.
pub const EXIT_RECON_RUNTIME: u8 = 4;

/// Rejected rows, ambiguous identities or unknown facilities under `--strict`.
/// Reports are still written before exiting with this code.
pub const EXIT_RECON_STRICT: u8 = 5;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_RECON_INVALID_CONFIG,
        ReconError::MissingColumn { .. } | ReconError::Csv { .. } | ReconError::Io(_) => {
            EXIT_RECON_RUNTIME
        }
    }
}
