//! Host platform utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Name of the environment variable pointing at the simulator root directory.
///
/// The root must contain the `params` directory, sessions are created inside
/// it as well.
pub const SIM_ROOT_ENV_VAR: &str = "MOOSE_SIM_ROOT";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum HostError {
    #[error("The software root environment variable ({0}) is not set")]
    SimRootNotSet(&'static str),

    #[error("The software root ({0:?}) is not a directory")]
    SimRootNotADir(PathBuf)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the root directory of the simulator software.
pub fn get_sim_root() -> Result<PathBuf, HostError> {
    let root = match std::env::var_os(SIM_ROOT_ENV_VAR) {
        Some(r) => PathBuf::from(r),
        None => return Err(HostError::SimRootNotSet(SIM_ROOT_ENV_VAR))
    };

    if !root.is_dir() {
        return Err(HostError::SimRootNotADir(root))
    }

    Ok(root)
}
