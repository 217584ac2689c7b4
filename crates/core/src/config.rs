use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "PHOTO_RENAME_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub destdir: PathBuf,
    pub recursive: bool,
    pub include_hidden: bool,
    pub move_files: bool,
    pub force: bool,
    pub verbose: bool,
    pub mtime_fallback: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            destdir: PathBuf::from("."),
            recursive: false,
            include_hidden: false,
            move_files: false,
            force: false,
            verbose: false,
            mtime_fallback: false,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let proj = ProjectDirs::from("org", "photo-rename", "photo-rename")
        .context("Could not determine the OS configuration directory")?;
    Ok(proj.config_dir().join("config.toml"))
}

pub fn load_config() -> Result<AppConfig> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("Could not read config file: {}", path.display()))?;
    let config = toml::from_str::<AppConfig>(&raw)
        .with_context(|| format!("Could not parse config file: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::{load_config_from, AppConfig};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = tempdir().expect("tempdir");
        let config = load_config_from(&temp.path().join("nope.toml")).expect("defaults");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.destdir, PathBuf::from("."));
    }

    #[test]
    fn partial_file_fills_remaining_defaults() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "destdir = \"sorted\"\nrecursive = true\n").expect("write config");

        let config = load_config_from(&path).expect("config");
        assert_eq!(config.destdir, PathBuf::from("sorted"));
        assert!(config.recursive);
        assert!(!config.move_files);
        assert!(!config.force);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "recursive = \"yes please\"").expect("write config");

        let err = load_config_from(&path).expect_err("bad type");
        assert!(err.to_string().contains("Could not parse config file"));
    }
}
