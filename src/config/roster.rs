//! Roster file configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Location of the class roster JSON file
#[derive(Debug, Clone, Deserialize)]
pub struct RosterConfig {
    #[serde(default = "default_path")]
    pub path: PathBuf,
}

impl RosterConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.path.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("ROSTER_PATH"));
        }
        Ok(())
    }
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("classes.json")
}
