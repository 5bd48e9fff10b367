use std::fs::File;
use std::io;
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Errors from turning a finished backup file into a zip archive.
///
/// The kinds stay distinct so the caller can tell "no archive was produced"
/// (`ArchiveCreation`) apart from "an archive file exists but may be
/// incomplete" (`EntryCreation`, `StreamCopy`).
#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("failed to create the destination zip file")]
    ArchiveCreation(#[source] io::Error),
    #[error("failed to create the backup entry inside the archive")]
    EntryCreation(#[source] ZipError),
    #[error("failed to copy the backup into the archive")]
    StreamCopy(#[source] ZipError),
}

/// Compresses a fully written backup file into a sibling `<backup_path>.zip`.
///
/// The archive holds a single entry named `<backup file name>.backup` whose
/// bytes are an exact copy of the backup file. The handle is rewound before
/// streaming. No cleanup is attempted on failure; a partial archive may
/// remain on disk and is the caller's to ignore or remove.
pub fn compress_backup_file(
    backup_file: &mut File,
    backup_path: &Path,
) -> Result<(), CompressionError> {
    let archive_path = archive_path_for(backup_path);

    let archive_file = File::create(&archive_path).map_err(CompressionError::ArchiveCreation)?;
    let mut writer = ZipWriter::new(archive_file);

    let base_name = backup_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    writer
        .start_file(format!("{base_name}.backup"), SimpleFileOptions::default())
        .map_err(CompressionError::EntryCreation)?;

    backup_file
        .seek(SeekFrom::Start(0))
        .map_err(|e| CompressionError::StreamCopy(e.into()))?;
    io::copy(backup_file, &mut writer).map_err(|e| CompressionError::StreamCopy(e.into()))?;
    writer.finish().map_err(CompressionError::StreamCopy)?;

    Ok(())
}

/// `<backup_directory>/<name>-bkup` becomes `<backup_directory>/<name>-bkup.zip`.
pub fn archive_path_for(backup_path: &Path) -> PathBuf {
    let mut path = backup_path.as_os_str().to_os_string();
    path.push(".zip");
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::io::{Read, Write};

    fn written_backup(path: &Path, content: &[u8]) -> File {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn test_archive_path_keeps_full_backup_name() {
        let archive = archive_path_for(Path::new("/out/db.sqlite-bkup"));
        assert_eq!(archive, PathBuf::from("/out/db.sqlite-bkup.zip"));
    }

    #[test]
    fn test_compress_produces_single_entry_with_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let backup_path = dir.path().join("db.sqlite-bkup");
        // Leave the cursor at the end of the file, as a fresh copy would.
        let mut backup_file = written_backup(&backup_path, b"0123456789");

        compress_backup_file(&mut backup_file, &backup_path).unwrap();

        let archive_path = dir.path().join("db.sqlite-bkup.zip");
        let mut archive = zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 1);

        let mut entry = archive.by_name("db.sqlite-bkup.backup").unwrap();
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"0123456789");
    }

    #[test]
    fn test_compress_empty_backup() {
        let dir = tempfile::tempdir().unwrap();
        let backup_path = dir.path().join("empty-bkup");
        let mut backup_file = written_backup(&backup_path, b"");

        compress_backup_file(&mut backup_file, &backup_path).unwrap();

        let archive_path = archive_path_for(&backup_path);
        let mut archive = zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        let mut entry = archive.by_name("empty-bkup.backup").unwrap();
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn test_blocked_archive_path_reports_archive_creation() {
        let dir = tempfile::tempdir().unwrap();
        let backup_path = dir.path().join("db.sqlite-bkup");
        let mut backup_file = written_backup(&backup_path, b"0123456789");

        // A directory squatting on the archive path makes file creation fail.
        std::fs::create_dir(dir.path().join("db.sqlite-bkup.zip")).unwrap();

        let error = compress_backup_file(&mut backup_file, &backup_path).unwrap_err();
        assert!(matches!(error, CompressionError::ArchiveCreation(_)));
    }
}
