//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the root of the software checkout.
pub const SW_ROOT_ENV_VAR: &str = "STEER_SW_ROOT";

/// Get the root directory of the software, as given by the `STEER_SW_ROOT` environment variable.
///
/// Parameter files are found under `<root>/params` and sessions are created under the root.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
