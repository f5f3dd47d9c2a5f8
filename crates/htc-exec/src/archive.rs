//! Extraction of job output archives into the dataset.

use crate::command::{CommandError, Runner};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::File;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("archive not found: {0}")]
    Missing(Utf8PathBuf),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Unpacks an archive into a destination directory.
pub trait Extractor {
    fn extract(&self, archive: &Utf8Path, destination: &Utf8Path) -> Result<(), ExtractError>;
}

fn ensure_archive(archive: &Utf8Path) -> Result<(), ExtractError> {
    if archive.is_file() {
        Ok(())
    } else {
        Err(ExtractError::Missing(archive.to_owned()))
    }
}

/// Runs the system `tar -xf` with the destination as working directory.
///
/// Compressed archives are handled by tar's own format detection.
#[derive(Debug, Clone)]
pub struct TarCommand {
    runner: Runner,
}

impl TarCommand {
    pub fn new(runner: Runner) -> Self {
        Self { runner }
    }
}

impl Extractor for TarCommand {
    fn extract(&self, archive: &Utf8Path, destination: &Utf8Path) -> Result<(), ExtractError> {
        ensure_archive(archive)?;
        // tar runs inside the destination, so relative archive paths would break
        let archive = archive.canonicalize_utf8()?;
        self.runner
            .run("tar", ["-xf", archive.as_str()], destination)?;
        Ok(())
    }
}

/// Unpacks uncompressed tar archives in-process.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarBuiltin;

impl Extractor for TarBuiltin {
    fn extract(&self, archive: &Utf8Path, destination: &Utf8Path) -> Result<(), ExtractError> {
        ensure_archive(archive)?;
        let file = File::open(archive)?;
        tar::Archive::new(file).unpack(destination)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn utf8(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap()
    }

    /// Build a tar holding `results/out.txt`.
    fn make_archive(path: &Utf8Path) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(file);
        let content = b"job output\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "results/out.txt", &content[..])
            .unwrap();
        builder.finish().unwrap();
    }

    fn check_extractor(extractor: &dyn Extractor) {
        let scratch = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let archive = utf8(&scratch).join("output");
        make_archive(&archive);

        extractor.extract(&archive, &utf8(&dest)).unwrap();
        let extracted = fs::read_to_string(utf8(&dest).join("results/out.txt")).unwrap();
        assert_eq!(extracted, "job output\n");
    }

    #[test]
    fn test_builtin_extracts() {
        check_extractor(&TarBuiltin);
    }

    #[test]
    fn test_command_extracts() {
        check_extractor(&TarCommand::new(Runner::new().unwrap()));
    }

    #[test]
    fn test_missing_archive() {
        let dest = TempDir::new().unwrap();
        let missing = utf8(&dest).join("output");
        let err = TarBuiltin.extract(&missing, &utf8(&dest)).unwrap_err();
        assert!(matches!(err, ExtractError::Missing(p) if p == missing));

        let err = TarCommand::new(Runner::new().unwrap())
            .extract(&missing, &utf8(&dest))
            .unwrap_err();
        assert!(matches!(err, ExtractError::Missing(_)));
    }

    #[test]
    fn test_corrupt_archive_fails() {
        let scratch = TempDir::new().unwrap();
        let archive = utf8(&scratch).join("output");
        fs::write(&archive, "definitely not a tarball").unwrap();

        let err = TarCommand::new(Runner::new().unwrap())
            .extract(&archive, &utf8(&scratch))
            .unwrap_err();
        assert!(matches!(err, ExtractError::Command(CommandError::Failed { .. })));
    }
}
