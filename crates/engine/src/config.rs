//! Library configuration via `circ.toml`
//!
//! A disk-backed library keeps its configuration in a `circ.toml` file in
//! the data directory. On first open, a default file with comments is
//! created. To change settings, edit the file and reopen — there is no
//! runtime reconfiguration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use circ_core::{Error, LendingPolicy, Result};

/// Config file name placed in the library data directory.
pub const CONFIG_FILE_NAME: &str = "circ.toml";

/// Library configuration loaded from `circ.toml`.
///
/// # Example
///
/// ```toml
/// [policy]
/// debt_warn_threshold = 400
/// debt_limit = 500
/// daily_fee = 10
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CircConfig {
    /// Lending policy thresholds and fee rate
    #[serde(default)]
    pub policy: LendingPolicy,
}

impl CircConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# CircDB library configuration
#
# Lending policy. All amounts are whole currency units.
[policy]
# Members at or above this debt are flagged "approaching limit".
debt_warn_threshold = 400
# Members at or above this debt cannot borrow.
debt_limit = 500
# Late fee charged per whole elapsed day at return time.
daily_fee = 10
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if the file cannot be parsed or the
    /// policy fails validation, `Error::Io` if it cannot be read.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CircConfig = toml::from_str(&content).map_err(|e| {
            Error::InvalidConfig(format!("failed to parse '{}': {}", path.display(), e))
        })?;
        config.policy.validate()?;
        Ok(config)
    }

    /// Load the config from a data directory, creating the default file on
    /// first open.
    pub fn load_or_init(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::from_file(&path)
        } else {
            std::fs::write(&path, Self::default_toml())?;
            Ok(Self::default())
        }
    }
}
