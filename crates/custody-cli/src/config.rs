use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use custody_core::custody::{CustodyPolicy, FinalStatusPolicy, StatusWriteMode};

#[derive(Debug, Serialize, Deserialize)]
pub struct CustodyConfig {
    pub database: DatabaseSection,
    #[serde(default)]
    pub custody: CustodySection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct CustodySection {
    #[serde(default)]
    pub final_status_policy: FinalStatusPolicy,
    #[serde(default)]
    pub status_write: StatusWriteMode,
}

impl CustodyConfig {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            database: DatabaseSection {
                path: db_path.to_string_lossy().to_string(),
            },
            custody: CustodySection::default(),
        }
    }

    pub fn policy(&self) -> CustodyPolicy {
        CustodyPolicy {
            final_status: self.custody.final_status_policy,
            status_write: self.custody.status_write,
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_db_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("custody.db"))
}

pub fn read_config(path: &Path) -> anyhow::Result<CustodyConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &CustodyConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("custody"));
        }
    }
    Ok(home_dir()?.join(".config").join("custody"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("custody"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("custody"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = CustodyConfig::new(PathBuf::from("/var/lib/custody.db"));

        write_config(&path, &config).unwrap();
        let loaded = read_config(&path).unwrap();

        assert_eq!(loaded.database.path, "/var/lib/custody.db");
        assert_eq!(loaded.policy(), CustodyPolicy::default());
    }

    #[test]
    fn test_custody_section_is_optional() {
        let config: CustodyConfig = toml::from_str("[database]\npath = \"a.db\"\n").unwrap();
        assert_eq!(config.policy(), CustodyPolicy::default());
    }

    #[test]
    fn test_policy_values_parse() {
        let config: CustodyConfig = toml::from_str(
            r#"
            [database]
            path = "a.db"

            [custody]
            final_status_policy = "allow_any_open"
            status_write = "transactional"
            "#,
        )
        .unwrap();
        let policy = config.policy();
        assert_eq!(policy.final_status, FinalStatusPolicy::AllowAnyOpen);
        assert_eq!(policy.status_write, StatusWriteMode::Transactional);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let result: Result<CustodyConfig, _> = toml::from_str(
            "[database]\npath = \"a.db\"\n[custody]\nstatus_write = \"sometimes\"\n",
        );
        assert!(result.is_err());
    }
}
