use crate::error::{Result, ScaffoldError};
use crate::ident::DottedId;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// PersistedConfig
// ---------------------------------------------------------------------------

/// Answers remembered between runs, stored in `.mozu-actions.json` at the
/// project root. Every field is optional so files written by older versions
/// keep loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub action_names: Vec<DottedId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_framework: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_pod: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer_account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_git: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_on_install: Option<bool>,
}

impl PersistedConfig {
    /// Load the project's config; a project without one yields the default.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        crate::io::write_json(&paths::config_path(root), self)
    }

    pub fn has_prior_selection(&self) -> bool {
        !self.domains.is_empty()
    }

    /// `--skip-prompts` replays the previous selection, so one must exist.
    pub fn require_prior_selection(&self, root: &Path) -> Result<()> {
        if self.has_prior_selection() {
            Ok(())
        } else {
            Err(ScaffoldError::NoPriorConfiguration(
                root.display().to_string(),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
