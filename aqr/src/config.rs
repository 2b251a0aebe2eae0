use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Fallback settings, used when neither a flag nor the environment sets them
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
}

impl CliConfig {
    pub fn path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("aquatrack").join("cli.json")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let config = serde_json::from_str(&data).context("parse cli config")?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(self).context("serialize cli config")?;
        fs::write(path, data).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    /// Deletes the file at `path`; a missing file is not an error
    pub fn reset_at(path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_file(path).with_context(|| format!("remove {}", path.display()))?;
        }
        Ok(())
    }

    /// Same config with the session value hidden, for display
    pub fn redacted(&self) -> Self {
        Self {
            url: self.url.clone(),
            session: self.session.as_ref().map(|_| "<redacted>".to_string()),
        }
    }
}
