//! Shared fixtures for integration tests

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary workspace with `source` and `destination` paths
///
/// Only the source directory is created; the destination is left for the
/// stager to create.
#[allow(dead_code)]
pub struct Workspace {
    pub temp: TempDir,
    pub source: PathBuf,
    pub destination: PathBuf,
}

#[allow(dead_code)]
pub fn workspace() -> Workspace {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    let destination = temp.path().join("destination");
    std::fs::create_dir(&source).unwrap();
    Workspace {
        temp,
        source,
        destination,
    }
}

/// Write one small file per name, its content being the name itself
#[allow(dead_code)]
pub fn write_files(dir: &Path, names: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    for name in names {
        std::fs::write(dir.join(name), format!("%PDF-1.4 {name}")).unwrap();
    }
}

/// Sorted names of the entries directly inside `dir`
#[allow(dead_code)]
pub fn entry_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
