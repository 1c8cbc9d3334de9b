//! Environment-driven defaults for entity definitions.

use anyhow::{Context, Result};
use fromenv::FromEnv;

/// Options loaded from the environment.
#[derive(Debug, Clone, Default, FromEnv)]
pub struct Options {
    /// Echo finalized SQL for entities that do not set `debug` themselves.
    #[env(from = "MODEL_SQL_DEBUG", default = "false")]
    pub debug: bool,
}

impl Options {
    /// Loads options from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn load() -> Result<Self> {
        Self::from_env().finalize().context("issue loading model options")
    }
}
