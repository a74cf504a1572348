//! Local file system document source.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::SourceError;
use crate::models::{Document, IngestionConfig};
use crate::utils::file::{is_text_file, read_file_content};

/// Scans a directory (or single file) for ingestable text documents.
#[derive(Debug)]
pub struct LocalSource {
    /// Root path to scan
    root: PathBuf,

    /// Glob patterns to exclude
    exclude_patterns: Vec<String>,

    /// Maximum file size in bytes
    max_file_size: u64,
}

impl LocalSource {
    pub fn new(root: PathBuf, exclude_patterns: Vec<String>, max_file_size: u64) -> Self {
        Self {
            root,
            exclude_patterns,
            max_file_size,
        }
    }

    pub fn from_config(root: PathBuf, config: &IngestionConfig) -> Self {
        Self::new(
            root,
            config.exclude_patterns.clone(),
            config.max_file_size,
        )
    }

    /// Collect the paths of all ingestable files under the root, in
    /// stable sorted order.
    pub fn collect_files(&self) -> Result<Vec<PathBuf>, SourceError> {
        if !self.root.exists() {
            return Err(SourceError::NotFound(
                self.root.to_string_lossy().to_string(),
            ));
        }

        if self.root.is_file() {
            return Ok(vec![self.root.clone()]);
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            if self.is_excluded(path) {
                debug!(path = %path.display(), "excluded by pattern");
                continue;
            }

            if is_text_file(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    /// Read one file into a Document.
    pub fn read_document(&self, path: &Path) -> Result<Document, SourceError> {
        let text =
            read_file_content(path, self.max_file_size).map_err(|e| SourceError::Read {
                path: path.to_string_lossy().to_string(),
                cause: e.to_string(),
            })?;

        Ok(Document::new(path, text))
    }

    /// Collect and read every ingestable file, yielding one result per
    /// file so the pipeline can skip unreadable ones.
    pub fn documents(&self) -> Result<Vec<Result<Document, SourceError>>, SourceError> {
        let files = self.collect_files()?;
        Ok(files
            .iter()
            .map(|path| self.read_document(path))
            .collect())
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.exclude_patterns.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|p| p.matches(&path_str))
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn source(root: &Path) -> LocalSource {
        LocalSource::new(
            root.to_path_buf(),
            vec!["**/.git/**".to_string(), "**/*.log".to_string()],
            1024 * 1024,
        )
    }

    #[test]
    fn test_collect_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "beta").unwrap();
        fs::write(dir.path().join("a.md"), "alpha").unwrap();
        fs::write(dir.path().join("skip.log"), "noise").unwrap();
        fs::write(dir.path().join("image.png"), [0x89u8, 0x50]).unwrap();

        let files = source(dir.path()).collect_files().unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.md", "b.txt"]);
    }

    #[test]
    fn test_missing_root_is_not_found() {
        let result = source(Path::new("/nonexistent/docs")).collect_files();
        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[test]
    fn test_single_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("only.txt");
        fs::write(&file, "content").unwrap();

        let files = source(&file).collect_files().unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_read_document_carries_filename() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, "some notes").unwrap();

        let doc = source(dir.path()).read_document(&file).unwrap();
        assert_eq!(doc.filename, "notes.txt");
        assert_eq!(doc.text, "some notes");
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_does_not_abort_enumeration() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("good.txt"), "fine").unwrap();

        let blocked = dir.path().join("blocked");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("hidden.txt"), "unreachable").unwrap();
        fs::set_permissions(&blocked, fs::Permissions::from_mode(0o000)).unwrap();

        let files = source(dir.path()).collect_files();

        fs::set_permissions(&blocked, fs::Permissions::from_mode(0o755)).unwrap();

        let files = files.unwrap();
        assert!(
            files
                .iter()
                .any(|p| p.file_name().unwrap() == "good.txt")
        );
    }

    #[test]
    fn test_unreadable_file_yields_per_document_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("big.txt");
        fs::write(&file, "x".repeat(64)).unwrap();

        let small = LocalSource::new(dir.path().to_path_buf(), vec![], 16);
        let docs = small.documents().unwrap();
        assert_eq!(docs.len(), 1);
        assert!(matches!(&docs[0], Err(SourceError::Read { .. })));
    }
}
