use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Contents of `qbank.toml`. Command-line flags take precedence over it.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct QbankConfig {
    /// SQLite database file
    pub database: Option<String>,
    /// Directory holding the subject/topic content tree
    pub root: Option<String>,
    /// Address for `qbank serve`
    pub listen: Option<String>,
}

pub const DEFAULT_DATABASE: &str = "question_bank.db";
pub const DEFAULT_ROOT: &str = "Question Bank";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:5000";

pub fn default_config_path() -> PathBuf {
    PathBuf::from("qbank.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<QbankConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: QbankConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &QbankConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Database and content root after applying flags over the config file over defaults
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPaths {
    pub database: PathBuf,
    pub root: PathBuf,
}

impl QbankConfig {
    pub fn resolve(&self, database: Option<PathBuf>, root: Option<PathBuf>) -> ResolvedPaths {
        ResolvedPaths {
            database: database
                .or_else(|| self.database.as_ref().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            root: root
                .or_else(|| self.root.as_ref().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT)),
        }
    }

    pub fn listen_addr(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.listen.clone())
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string())
    }
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_config(Some(&dir.path().join("qbank.toml"))).unwrap(), None);
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qbank.toml");
        let config = QbankConfig {
            database: Some("data/bank.db".into()),
            root: Some("content".into()),
            listen: None,
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        assert_eq!(load_config(Some(&path)).unwrap(), Some(config));
    }

    #[test]
    fn test_flags_override_file_and_defaults() {
        let config = QbankConfig {
            database: Some("from_file.db".into()),
            ..Default::default()
        };

        let paths = config.resolve(None, None);
        assert_eq!(paths.database, PathBuf::from("from_file.db"));
        assert_eq!(paths.root, PathBuf::from(DEFAULT_ROOT));

        let paths = config.resolve(Some("flag.db".into()), Some("elsewhere".into()));
        assert_eq!(paths.database, PathBuf::from("flag.db"));
        assert_eq!(paths.root, PathBuf::from("elsewhere"));

        assert_eq!(config.listen_addr(None), DEFAULT_LISTEN);
    }

    #[test]
    fn test_ensure_db_dir_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("bank.db");
        ensure_db_dir(&db).unwrap();
        assert!(dir.path().join("nested").is_dir());
    }
}
