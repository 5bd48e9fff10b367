use crate::backup::cycle::BackupLocations;
use crate::backup::validate::{validate_interval, validate_source_file, validate_writable_dir};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

/// Daemon configuration, loaded from a YAML file.
///
/// `interval` accepts human-readable durations ("30s", "15m", "2h"). The
/// backup task itself trusts these values; validation happens here, once,
/// before the task is spawned.
#[derive(Clone, Serialize, Deserialize, Debug, Validate)]
pub struct BackupConfig {
    #[validate(custom(function = validate_source_file))]
    pub source: Arc<Path>,
    #[validate(custom(function = validate_writable_dir))]
    pub backup_dir: Arc<Path>,
    #[serde(with = "humantime_serde")]
    #[validate(custom(function = validate_interval))]
    pub interval: Duration,
}

impl BackupConfig {
    pub fn locations(&self) -> BackupLocations {
        BackupLocations::new(self.source.clone(), self.backup_dir.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_yaml(dir: &Path) -> String {
        format!(
            "source: {}\nbackup_dir: {}\ninterval: 50ms\n",
            dir.join("db.sqlite").display(),
            dir.join("out").display(),
        )
    }

    #[test]
    fn test_config_parses_humantime_interval() {
        let dir = tempfile::tempdir().unwrap();
        let config: BackupConfig = serde_yml::from_str(&config_yaml(dir.path())).unwrap();

        assert_eq!(config.interval, Duration::from_millis(50));
        assert_eq!(config.source.as_ref(), dir.path().join("db.sqlite"));
    }

    #[test]
    fn test_config_validates_once_source_exists() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("db.sqlite"), b"x").unwrap();

        let config: BackupConfig = serde_yml::from_str(&config_yaml(dir.path())).unwrap();
        config.validate().unwrap();

        let locations = config.locations();
        assert_eq!(
            locations.backup_file_path(),
            dir.path().join("out/db.sqlite-bkup")
        );
    }

    #[test]
    fn test_config_rejects_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let config: BackupConfig = serde_yml::from_str(&config_yaml(dir.path())).unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_zero_interval() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("db.sqlite"), b"x").unwrap();

        let yaml = format!(
            "source: {}\nbackup_dir: {}\ninterval: 0s\n",
            dir.path().join("db.sqlite").display(),
            dir.path().join("out").display(),
        );
        let config: BackupConfig = serde_yml::from_str(&yaml).unwrap();

        assert!(config.validate().is_err());
    }
}
