//! Identity roster location

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// JSON file holding `[{userId, gender}]` records
    #[serde(default = "default_roster_path")]
    pub path: PathBuf,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            path: default_roster_path(),
        }
    }
}

impl Validatable for RosterConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.path.to_string_lossy(), "path", self.domain_name())
    }

    fn domain_name(&self) -> &'static str {
        "roster"
    }
}

fn default_roster_path() -> PathBuf {
    PathBuf::from("test-users.json")
}
