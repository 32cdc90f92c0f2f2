use anyhow::Context;
use std::path::{Path, PathBuf};
use storyweaver_core::config::AppConfig;

use crate::defaults::default_app_config;

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> anyhow::Result<AppConfig> {
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("read config: {}", self.path.display()))?;
        let cfg: AppConfig = serde_json::from_slice(&bytes).context("decode config JSON")?;
        Ok(cfg)
    }

    /// Defaults when no config file exists yet. A file that exists but does not
    /// parse is still an error.
    pub fn load_or_default(&self) -> anyhow::Result<AppConfig> {
        if !self.path.exists() {
            log::info!("no config at {}; using defaults", self.path.display());
            return Ok(default_app_config());
        }
        self.load()
    }

    pub fn save(&self, cfg: &AppConfig) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(cfg).context("encode config JSON")?;
        crate::files::write_atomic(&self.path, &json)
            .with_context(|| format!("write config: {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at_path(dir.path().join("config.json"));

        let mut cfg = default_app_config();
        cfg.models.text = "gemini-test".into();
        cfg.video.poll.max_attempts = Some(12);

        store.save(&cfg).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at_path(dir.path().join("absent.json"));
        let cfg = store.load_or_default().unwrap();
        assert_eq!(cfg.images.count, 4);
        assert_eq!(cfg.video.poll.interval_ms, 10_000);
    }

    #[test]
    fn broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{").unwrap();
        assert!(ConfigStore::at_path(path).load_or_default().is_err());
    }

    #[test]
    fn timeouts_default_when_absent() {
        let mut value = serde_json::to_value(default_app_config()).unwrap();
        let obj = value.as_object_mut().unwrap();
        obj.remove("connect_timeout_secs");
        obj.remove("request_timeout_secs");
        let cfg: AppConfig = serde_json::from_value(value).unwrap();
        assert_eq!(cfg.connect_timeout_secs, 10);
        assert_eq!(cfg.request_timeout_secs, 120);
    }
}
