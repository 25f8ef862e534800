use crate::services::tabular::{SourceHandle, is_supported};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively walk `dir`, returning the tabular files in it, sorted by path.
pub fn scan_directory(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_supported(path) && !is_lock_file(path))
        .collect();
    files.sort();
    files
}

// Office leaves `~$name.xlsx` next to open workbooks
fn is_lock_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("~$"))
}

/// Explicit files first, then directory contents; a path already added is
/// not added again.
pub fn collect_sources(files: &[PathBuf], dirs: &[PathBuf]) -> Vec<SourceHandle> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut handles = Vec::new();

    let candidates = files
        .iter()
        .cloned()
        .chain(dirs.iter().flat_map(|dir| scan_directory(dir)));
    for path in candidates {
        if seen.insert(path.clone()) {
            handles.push(SourceHandle::new(path));
        }
    }

    let mut names: HashSet<&str> = HashSet::new();
    for handle in &handles {
        if !names.insert(handle.name.as_str()) {
            log::warn!(
                "Two sources are named {}; their removals will be shared",
                handle.name
            );
        }
    }

    handles
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_directory_finds_tabular_files() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(temp_dir.path().join("b.csv"), "Name\n").unwrap();
        fs::write(nested.join("a.xlsx"), b"").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "x").unwrap();
        fs::write(temp_dir.path().join("~$b.xlsx"), b"").unwrap();

        let files = scan_directory(temp_dir.path());
        assert_eq!(
            files,
            vec![temp_dir.path().join("b.csv"), nested.join("a.xlsx")]
        );
    }

    #[test]
    fn test_collect_sources_skips_repeated_paths() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.csv");
        fs::write(&a, "Name\n").unwrap();

        let handles = collect_sources(&[a.clone(), a.clone()], &[temp_dir.path().to_path_buf()]);
        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].name, "a.csv");
    }
}
