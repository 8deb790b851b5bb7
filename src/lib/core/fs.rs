use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{HexSgeError, Result};

/// Create parent directories for a path when missing.
pub fn make_parent_dirs<P: AsRef<Path>>(path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Detect whether a path uses a gzip-compatible extension.
pub fn is_gzipped<P: AsRef<Path>>(path: P) -> bool {
    matches!(
        path.as_ref().extension().unwrap_or_else(|| OsStr::new("")),
        ext if ext == "gz" || ext == "gzip" || ext == "bgz" || ext == "bgzf"
    )
}

/// Detect a bzip2 extension.
pub fn is_bzipped<P: AsRef<Path>>(path: P) -> bool {
    matches!(
        path.as_ref().extension().unwrap_or_else(|| OsStr::new("")),
        ext if ext == "bz2" || ext == "bzip2"
    )
}

/// Fail with [`HexSgeError::FileNotFound`] unless `path` names a readable regular file.
pub fn require_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(HexSgeError::FileNotFound(path.display().to_string())),
    }
}

/// Join an output prefix and a file suffix verbatim (`out/sample.` + `matrix.mtx.gz`).
pub fn prefixed_path(prefix: &str, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}{}", prefix, suffix))
}

/// Directory in which temporaries for `target` should live so that a rename is atomic.
pub fn sibling_dir(target: &Path) -> PathBuf {
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn recognises_gzip_extensions() {
        assert!(is_gzipped("pixels.tsv.gz"));
        assert!(is_gzipped("pixels.tsv.bgzf"));
        assert!(!is_gzipped("pixels.tsv"));
        assert!(!is_gzipped("pixels"));
        assert!(is_bzipped("pixels.tsv.bz2"));
        assert!(!is_bzipped("pixels.tsv.gz"));
    }

    #[test]
    fn prefix_is_concatenated_verbatim() {
        assert_eq!(
            prefixed_path("out/sample.", "barcode.tsv.gz"),
            PathBuf::from("out/sample.barcode.tsv.gz")
        );
        assert_eq!(sibling_dir(Path::new("matrix.mtx.gz")), PathBuf::from("."));
        assert_eq!(sibling_dir(Path::new("a/b.gz")), PathBuf::from("a"));
    }

    #[test]
    fn require_file_rejects_missing_and_directories() -> anyhow::Result<()> {
        let dir = tempdir()?;
        assert!(matches!(
            require_file(dir.path().join("missing.tsv")),
            Err(HexSgeError::FileNotFound(_))
        ));
        assert!(require_file(dir.path()).is_err());

        let file = dir.path().join("present.tsv");
        fs::write(&file, "X\tY\n")?;
        require_file(&file)?;

        let nested = dir.path().join("a/b/out.");
        make_parent_dirs(&nested)?;
        assert!(dir.path().join("a/b").is_dir());
        Ok(())
    }
}
