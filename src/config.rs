use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BinderConfig {
    /// SQLite database holding the stored graph
    pub database: Option<String>,
    /// Snapshot file (JSON or TOML) to bind against instead of the database
    pub graph: Option<String>,
    /// Default enclosing module, as `Project.Module`
    pub module: Option<String>,
    pub log_level: Option<String>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("vbabind.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".vbabind").join("vbabind.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<BinderConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: BinderConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &BinderConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
