use anyhow::{Context, Result};
use log::warn;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &["__pycache__", "venv", "node_modules", "site-packages"];

/// File scanner for traversing source directories.
///
/// The `FileScanner` recursively walks a directory to find all Python source
/// files. Hidden directories (those starting with `.`) and the entries of
/// [`SKIPPED_DIRS`] are ignored. Files are visited in file-name order so the
/// resulting list, and therefore the endpoint order, is stable across
/// platforms.
///
/// # Example
///
/// ```no_run
/// use openapi_from_python::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-service"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} Python files", result.python_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// Result of directory scanning operation.
pub struct ScanResult {
    /// Paths to all discovered `.py` files, sorted
    pub python_files: Vec<PathBuf>,
    /// Warning messages for entries that could not be accessed
    pub warnings: Vec<String>,
}

impl FileScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the directory tree and collects all `.py` files.
    ///
    /// Inaccessible entries are logged and recorded in
    /// [`ScanResult::warnings`] without stopping the scan.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be accessed.
    pub fn scan(&self) -> Result<ScanResult> {
        std::fs::metadata(&self.root_path)
            .with_context(|| format!("Cannot access {}", self.root_path.display()))?;

        let mut python_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the root directory itself
                if e.path() == self.root_path {
                    return true;
                }

                let file_name = e.file_name().to_string_lossy();
                let is_hidden = file_name.starts_with('.');
                let is_skipped = e.file_type().is_dir() && SKIPPED_DIRS.contains(&&*file_name);

                !is_hidden && !is_skipped
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("py") {
                        python_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(ScanResult {
            python_files,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn file_names(result: &ScanResult) -> Vec<String> {
        result
            .python_files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_scan_normal_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("main.py"), "app = None").unwrap();
        fs::write(root.join("api.py"), "def f(): pass").unwrap();
        fs::write(root.join("readme.md"), "# README").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();

        assert!(result.warnings.is_empty());
        assert_eq!(file_names(&result), vec!["api.py", "main.py"]);
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();

        let result = FileScanner::new(temp_dir.path().to_path_buf()).scan().unwrap();

        assert!(result.python_files.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("app/routers")).unwrap();
        fs::write(root.join("main.py"), "").unwrap();
        fs::write(root.join("app/__init__.py"), "").unwrap();
        fs::write(root.join("app/routers/users.py"), "").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();

        assert_eq!(result.python_files.len(), 3);
    }

    #[test]
    fn test_scan_skips_hidden_and_cache_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join(".venv")).unwrap();
        fs::write(root.join(".venv/lib.py"), "").unwrap();
        fs::create_dir(root.join("__pycache__")).unwrap();
        fs::write(root.join("__pycache__/main.py"), "").unwrap();
        fs::create_dir(root.join("venv")).unwrap();
        fs::write(root.join("venv/site.py"), "").unwrap();
        fs::write(root.join("main.py"), "").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();

        assert_eq!(file_names(&result), vec!["main.py"]);
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let result = FileScanner::new(PathBuf::from("/nonexistent/project")).scan();
        assert!(result.is_err());
    }
}
