//! File utilities for ingestion.

use std::fs;
use std::io::Read;
use std::path::Path;

/// Check if a file is likely a text file.
pub fn is_text_file(path: &Path) -> bool {
    // Check by extension
    if let Some(ext) = path.extension() {
        let ext = ext.to_string_lossy().to_lowercase();
        if is_binary_extension(&ext) {
            return false;
        }
        if is_text_extension(&ext) {
            return true;
        }
    }

    // Check by reading first bytes
    if let Ok(file) = fs::File::open(path) {
        let mut buffer = [0u8; 512];
        let mut reader = std::io::BufReader::new(file);
        if let Ok(n) = reader.read(&mut buffer) {
            if n == 0 {
                return true; // Empty file is text
            }
            // Null bytes indicate binary content
            if buffer[..n].contains(&0) {
                return false;
            }
            return true;
        }
    }

    false
}

/// Read file content with size limit.
pub fn read_file_content(path: &Path, max_size: u64) -> std::io::Result<String> {
    let metadata = fs::metadata(path)?;

    if metadata.len() > max_size {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "file exceeds maximum size: {} > {}",
                metadata.len(),
                max_size
            ),
        ));
    }

    fs::read_to_string(path)
}

/// Check if extension indicates a binary file.
fn is_binary_extension(ext: &str) -> bool {
    matches!(
        ext,
        "exe"
            | "dll"
            | "so"
            | "dylib"
            | "a"
            | "o"
            | "obj"
            | "png"
            | "jpg"
            | "jpeg"
            | "gif"
            | "bmp"
            | "ico"
            | "webp"
            | "svg"
            | "mp3"
            | "mp4"
            | "avi"
            | "mkv"
            | "mov"
            | "wav"
            | "flac"
            | "zip"
            | "tar"
            | "gz"
            | "bz2"
            | "xz"
            | "7z"
            | "rar"
            | "pdf"
            | "doc"
            | "docx"
            | "xls"
            | "xlsx"
            | "ppt"
            | "pptx"
            | "woff"
            | "woff2"
            | "ttf"
            | "otf"
            | "eot"
            | "class"
            | "jar"
            | "pyc"
            | "pyo"
            | "db"
            | "sqlite"
            | "sqlite3"
            | "bin"
            | "dat"
            | "pak"
    )
}

/// Check if extension indicates a text file.
fn is_text_extension(ext: &str) -> bool {
    matches!(
        ext,
        // Documentation
        "md" | "markdown" | "rst" | "txt" | "adoc" | "org"
            // Data/Config
            | "json" | "yaml" | "yml" | "toml" | "xml" | "ini" | "cfg"
            | "env" | "properties" | "conf" | "csv" | "tsv"
            // Source code
            | "rs" | "py" | "js" | "ts" | "go" | "java" | "c" | "h" | "cpp" | "hpp"
            | "rb" | "php" | "sh" | "bash" | "sql"
            // Web
            | "html" | "htm" | "css"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_is_binary_extension() {
        assert!(is_binary_extension("exe"));
        assert!(is_binary_extension("png"));
        assert!(!is_binary_extension("txt"));
        assert!(!is_binary_extension("md"));
    }

    #[test]
    fn test_is_text_extension() {
        assert!(is_text_extension("txt"));
        assert!(is_text_extension("md"));
        assert!(is_text_extension("csv"));
        assert!(!is_text_extension("png"));
    }

    #[test]
    fn test_is_text_file() {
        let path = PathBuf::from("notes.txt");
        assert!(is_text_file(&path));

        let path = PathBuf::from("photo.png");
        assert!(!is_text_file(&path));
    }

    #[test]
    fn test_read_file_content_enforces_limit() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("big.txt");
        std::fs::write(&file, "x".repeat(100)).unwrap();

        assert!(read_file_content(&file, 50).is_err());
        assert_eq!(read_file_content(&file, 200).unwrap().len(), 100);
    }
}
