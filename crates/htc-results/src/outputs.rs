//! Expansion of declared input/output patterns.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use globset::GlobBuilder;
use walkdir::WalkDir;

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Directory the patterns are relative to: `<dataset>/<pwd>`.
fn base_dir(dataset: &Utf8Path, pwd: &Utf8Path) -> Utf8PathBuf {
    let mut base = dataset.to_owned();
    for component in pwd.components() {
        match component {
            Utf8Component::CurDir => {}
            other => base.push(other.as_str()),
        }
    }
    base
}

/// Expand `patterns` relative to `<dataset>/<pwd>` into absolute paths.
///
/// Plain paths are joined as they are. Glob patterns are matched against the
/// tree below the base directory; a pattern that matches nothing is kept
/// literally.
pub fn expand_patterns(dataset: &Utf8Path, pwd: &Utf8Path, patterns: &[String]) -> Vec<Utf8PathBuf> {
    let base = base_dir(dataset, pwd);
    let mut expanded = Vec::new();

    for pattern in patterns {
        if !is_glob(pattern) {
            expanded.push(base.join(pattern));
            continue;
        }
        match glob_matches(&base, pattern) {
            Ok(matches) if !matches.is_empty() => expanded.extend(matches),
            Ok(_) => expanded.push(base.join(pattern)),
            Err(e) => {
                tracing::warn!("Invalid path pattern {}: {}", pattern, e);
                expanded.push(base.join(pattern));
            }
        }
    }

    expanded
}

fn glob_matches(base: &Utf8Path, pattern: &str) -> Result<Vec<Utf8PathBuf>, globset::Error> {
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()?
        .compile_matcher();

    let walker = WalkDir::new(base)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git");

    let mut matches = Vec::new();
    for entry in walker.filter_map(Result::ok) {
        let Ok(relative) = entry.path().strip_prefix(base) else {
            continue;
        };
        if relative.as_os_str().is_empty() || !matcher.is_match(relative) {
            continue;
        }
        if let Some(path) = Utf8Path::from_path(entry.path()) {
            matches.push(path.to_owned());
        }
    }
    Ok(matches)
}

/// Render `path` relative to the dataset root when it lies inside it.
pub fn dataset_relative(dataset: &Utf8Path, path: &Utf8Path) -> String {
    path.strip_prefix(dataset)
        .map(|rel| rel.to_string())
        .unwrap_or_else(|_| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn dataset() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        fs::create_dir_all(root.join("results")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("results/a.csv"), "").unwrap();
        fs::write(root.join("results/b.csv"), "").unwrap();
        fs::write(root.join("results/notes.txt"), "").unwrap();
        fs::write(root.join(".git/c.csv"), "").unwrap();
        (temp, root)
    }

    #[test]
    fn test_plain_paths_are_joined() {
        let (_temp, root) = dataset();
        let out = expand_patterns(&root, Utf8Path::new("."), &["here".to_string()]);
        assert_eq!(out, vec![root.join("here")]);
    }

    #[test]
    fn test_globs_expand_sorted() {
        let (_temp, root) = dataset();
        let out = expand_patterns(&root, Utf8Path::new("."), &["results/*.csv".to_string()]);
        assert_eq!(out, vec![root.join("results/a.csv"), root.join("results/b.csv")]);
    }

    #[test]
    fn test_glob_relative_to_pwd() {
        let (_temp, root) = dataset();
        let out = expand_patterns(&root, Utf8Path::new("results"), &["*.txt".to_string()]);
        assert_eq!(out, vec![root.join("results/notes.txt")]);
    }

    #[test]
    fn test_unmatched_glob_is_kept() {
        let (_temp, root) = dataset();
        let out = expand_patterns(&root, Utf8Path::new("."), &["*.bam".to_string()]);
        assert_eq!(out, vec![root.join("*.bam")]);
    }

    #[test]
    fn test_git_dir_is_not_searched() {
        let (_temp, root) = dataset();
        let out = expand_patterns(&root, Utf8Path::new("."), &["**/c.csv".to_string()]);
        assert_eq!(out, vec![root.join("**/c.csv")]);
    }

    #[test]
    fn test_dataset_relative() {
        let root = Utf8Path::new("/ds");
        assert_eq!(dataset_relative(root, Utf8Path::new("/ds/results/a.csv")), "results/a.csv");
        assert_eq!(dataset_relative(root, Utf8Path::new("/elsewhere")), "/elsewhere");
    }
}
