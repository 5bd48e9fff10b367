use crate::backup::compress::compress_backup_file;
use std::fs::{File, OpenOptions};
use std::io;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Source and destination of a backup task.
///
/// Supplied once at task creation and immutable for the task's lifetime.
#[derive(Clone, Debug)]
pub struct BackupLocations {
    pub source_path: Arc<Path>,
    pub backup_directory: Arc<Path>,
}

impl BackupLocations {
    pub fn new<A: Into<Arc<Path>>, B: Into<Arc<Path>>>(
        source_path: A,
        backup_directory: B,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            backup_directory: backup_directory.into(),
        }
    }

    /// Path of the uncompressed backup file produced by a cycle:
    /// `<backup_directory>/<source base name>-bkup`.
    pub fn backup_file_path(&self) -> PathBuf {
        let base_name = self
            .source_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.backup_directory.join(format!("{base_name}-bkup"))
    }
}

/// Errors that abort a single backup cycle.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("failed to create the backup directory {path:?}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to open the source file {path:?}")]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to create the destination file {path:?}")]
    DestinationCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read the source file into the copy buffer")]
    Read(#[source] io::Error),
    #[error("failed to write the copy buffer into the destination file")]
    Write(#[source] io::Error),
}

const COPY_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Runs one full copy-then-archive cycle.
///
/// Copies the source file into the backup directory, then wraps the copy into
/// a zip archive and removes the uncompressed copy. A failed archive step is
/// logged and the cycle still succeeds: the uncompressed backup satisfies the
/// durability contract on its own. A failed copy leaves any partial
/// destination file on disk; the cycle does not roll back.
pub fn run_cycle(locations: &BackupLocations) -> Result<(), CycleError> {
    let destination_path = locations.backup_file_path();
    info!(
        "starting backup of {:?} into {:?}",
        locations.source_path, destination_path
    );

    create_backup_directory(&locations.backup_directory)?;

    let source = File::open(locations.source_path.as_ref()).map_err(|e| CycleError::SourceOpen {
        path: locations.source_path.to_path_buf(),
        source: e,
    })?;

    // Opened read+write so the archiver can stream from the same handle.
    let mut destination = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(&destination_path)
        .map_err(|e| CycleError::DestinationCreate {
            path: destination_path.clone(),
            source: e,
        })?;

    copy_source_into(source, &mut destination)?;
    info!("finished backing up {:?}", locations.source_path);

    if let Err(compression_error) = compress_backup_file(&mut destination, &destination_path) {
        warn!(
            "compressing {:?} failed, but the backup exists: {}",
            destination_path, compression_error
        );
        return Ok(());
    }
    info!("successfully compressed the backup file");

    drop(destination);
    if let Err(remove_error) = std::fs::remove_file(&destination_path) {
        warn!(
            "failed deleting the uncompressed backup {:?}: {}",
            destination_path, remove_error
        );
    }

    Ok(())
}

fn create_backup_directory(dir: &Path) -> Result<(), CycleError> {
    #[cfg(unix)]
    let created = {
        use std::os::unix::fs::DirBuilderExt;
        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(0o740)
            .create(dir)
    };
    #[cfg(not(unix))]
    let created = std::fs::create_dir_all(dir);

    created.map_err(|e| CycleError::DirectoryCreate {
        path: dir.to_path_buf(),
        source: e,
    })
}

fn copy_source_into(source: File, destination: &mut File) -> Result<(), CycleError> {
    let mut reader = BufReader::new(source);
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];

    loop {
        let read = reader.read(&mut buffer).map_err(CycleError::Read)?;
        if read == 0 {
            break;
        }
        destination
            .write_all(&buffer[..read])
            .map_err(CycleError::Write)?;
    }

    Ok(())
}
