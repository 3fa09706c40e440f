//! Path utilities for locating workspace files from tests.

use std::path::PathBuf;

/// Returns the workspace root directory.
///
/// Walks up from the test-utils manifest directory (`crates/test-utils`).
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Returns `services/{service_name}/config/{file}`.
pub fn service_config_path(service_name: &str, file: &str) -> PathBuf {
    workspace_root()
        .join("services")
        .join(service_name)
        .join("config")
        .join(file)
}

/// Creates a temporary directory for test output, removed on drop.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("solar_test_")
        .tempdir()
        .expect("Failed to create temporary test directory")
}
