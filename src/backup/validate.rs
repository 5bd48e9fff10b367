//! Validation functions for configuration values.
//!
//! Provides custom validation functions for the backup source file, the
//! backup destination directory, and the backup interval. The task loop
//! itself never re-checks these; the configuration layer is the only gate.

use std::path::Path;
use std::time::Duration;
use validator::ValidationError;

pub fn validate_source_file<P: AsRef<Path>>(path: P) -> Result<(), ValidationError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ValidationError::new("InvalidSourceFile")
            .with_message(format!("{:?} not found", path).into()));
    }
    if !path.is_file() {
        return Err(ValidationError::new("InvalidSourceFile")
            .with_message(format!("{:?} is not a regular file", path).into()));
    }

    Ok(())
}

pub fn validate_dir_exist_or_created<P: AsRef<Path>>(dir: P) -> Result<(), ValidationError> {
    let dir = dir.as_ref();
    if dir.exists() {
        if !dir.is_dir() {
            return Err(ValidationError::new("InvalidDirectory")
                .with_message(format!("{:?} is not a directory", dir).into()));
        }
    } else {
        return std::fs::create_dir_all(dir).map_err(|e| {
            ValidationError::new("InvalidDirectory").with_message(
                format!("cannot create or access backup_dir path {:?}: {}", dir, e).into(),
            )
        });
    }

    Ok(())
}

pub fn validate_writable_dir<P: AsRef<Path>>(dir: P) -> Result<(), ValidationError> {
    let dir = dir.as_ref();
    validate_dir_exist_or_created(dir)?;
    let md = std::fs::metadata(dir).map_err(|e| {
        ValidationError::new("InvalidDirectory")
            .with_message(format!("cannot access metadata for {:?}: {}", dir, e).into())
    })?;
    if md.permissions().readonly() {
        Err(ValidationError::new("InvalidDirectory")
            .with_message(format!("cannot write to dir {:?}", dir).into()))
    } else {
        Ok(())
    }
}

pub fn validate_interval(interval: &Duration) -> Result<(), ValidationError> {
    if interval.is_zero() {
        return Err(ValidationError::new("InvalidInterval")
            .with_message("interval must be positive".into()));
    }

    Ok(())
}
