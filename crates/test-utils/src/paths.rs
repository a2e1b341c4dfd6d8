//! Temporary locations for cache files and CLI outputs.

use std::path::PathBuf;

/// Creates a temporary directory, removed when the returned `TempDir` drops.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("traffic_test_")
        .tempdir()
        .expect("Failed to create temporary test directory")
}

/// Standard file layout of one CLI run inside a temporary directory.
pub struct RunPaths {
    pub dir: tempfile::TempDir,
    pub input: PathBuf,
    pub cache: PathBuf,
    pub output: PathBuf,
}

impl RunPaths {
    pub fn new() -> Self {
        let dir = temp_test_dir();
        let input = dir.path().join("data.json");
        let cache = dir.path().join("cache.json");
        let output = dir.path().join("result.json");
        Self {
            dir,
            input,
            cache,
            output,
        }
    }

    /// Write `payload` as the input file.
    pub fn write_input(&self, payload: &str) {
        std::fs::write(&self.input, payload).expect("Failed to write input payload");
    }
}

impl Default for RunPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_paths_share_a_directory() {
        let paths = RunPaths::new();
        assert!(paths.dir.path().exists());
        assert_eq!(paths.input.parent(), Some(paths.dir.path()));
        assert!(!paths.cache.exists());

        paths.write_input("{}");
        assert!(paths.input.exists());
    }
}
