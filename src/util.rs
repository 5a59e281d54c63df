/// Shared filesystem helpers for the command layer.
pub mod fs {
    use std::fs;
    use std::io;

    use camino::Utf8Path;

    /// Ensure the directory holding `path` exists, creating it recursively if needed.
    /// Returns `true` when something was created.
    pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<bool> {
        let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) else {
            return Ok(false);
        };
        if parent.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(parent)?;
        Ok(true)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use camino::Utf8PathBuf;

        #[test]
        fn creates_nested_parent_once() {
            let dir = tempfile::tempdir().unwrap();
            let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
            let target = root.join("data").join("raw").join("sample.csv");

            assert!(ensure_parent_dir(&target).unwrap());
            assert!(root.join("data").join("raw").is_dir());
            assert!(!ensure_parent_dir(&target).unwrap());
        }

        #[test]
        fn bare_file_name_needs_nothing() {
            assert!(!ensure_parent_dir(Utf8Path::new("sample.csv")).unwrap());
        }
    }
}
