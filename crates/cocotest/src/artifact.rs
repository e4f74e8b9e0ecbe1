//! Temporary test executables.

use crate::error::{HarnessError, HarnessResult};
use std::io::ErrorKind;
use std::path::Path;
use tempfile::TempPath;

/// A uniquely named temporary executable path owned by one test iteration.
///
/// The file is removed by [`TempArtifact::release`]. If the iteration
/// unwinds before that, dropping the artifact removes it as well.
#[derive(Debug)]
pub struct TempArtifact {
    path: TempPath,
}

impl TempArtifact {
    /// Reserve a fresh path in the system temp directory.
    ///
    /// The placeholder file is closed immediately so the compiler can
    /// replace it and the result can be executed.
    pub fn create(prefix: &str) -> HarnessResult<Self> {
        let file = tempfile::Builder::new().prefix(prefix).tempfile()?;
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    /// Location of the executable.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the executable.
    ///
    /// A file that no longer exists (e.g. after a failed compile that
    /// unlinked it) is not an error.
    pub fn release(self) -> HarnessResult<()> {
        let path = self.path.to_path_buf();
        match self.path.close() {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(HarnessError::Cleanup { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_removes_file() {
        let artifact = TempArtifact::create("cocotest_").unwrap();
        let path = artifact.path().to_path_buf();
        assert!(path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("cocotest_"));

        artifact.release().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_release_tolerates_missing_file() {
        let artifact = TempArtifact::create("cocotest_").unwrap();
        let path = artifact.path().to_path_buf();
        std::fs::remove_file(&path).unwrap();

        artifact.release().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_file() {
        let artifact = TempArtifact::create("cocotest_").unwrap();
        let path = artifact.path().to_path_buf();
        drop(artifact);
        assert!(!path.exists());
    }

    #[test]
    fn test_paths_are_unique() {
        let a = TempArtifact::create("cocotest_").unwrap();
        let b = TempArtifact::create("cocotest_").unwrap();
        assert_ne!(a.path(), b.path());
    }
}
