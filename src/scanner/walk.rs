use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::constants::scanner::MAX_DEPTH;

/// Depth-bounded directory traversal that never follows symlinks.
///
/// Ignore files and hidden-entry filters are disabled: documentation must
/// reflect the tree as it is on disk, not what version control tracks.
pub struct TreeWalker {
    root: PathBuf,
    max_depth: usize,
    extensions: Vec<String>,
}

/// Directories and matching files found below a root (root excluded)
#[derive(Debug, Default, Clone)]
pub struct WalkedTree {
    pub dirs: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
    /// Entries the walker could not read
    pub errors: Vec<String>,
}

impl TreeWalker {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            max_depth: MAX_DEPTH,
            extensions: Vec::new(),
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Only collect files with one of these extensions (empty = all files)
    pub fn with_extensions(mut self, extensions: &[String]) -> Self {
        self.extensions = extensions.to_vec();
        self
    }

    pub fn walk(&self) -> WalkedTree {
        let mut tree = WalkedTree::default();
        if !self.root.is_dir() {
            return tree;
        }

        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .follow_links(false) // symlink loops cannot occur
            .max_depth(Some(self.max_depth))
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut visited: HashSet<PathBuf> = HashSet::new();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tree.errors.push(err.to_string());
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }

            let Some(file_type) = entry.file_type() else {
                continue;
            };
            let path = entry.path();

            if file_type.is_dir() {
                let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
                if visited.insert(key) {
                    tree.dirs.push(path.to_path_buf());
                }
            } else if file_type.is_file() && self.matches_extension(path) {
                tree.files.push(path.to_path_buf());
            }
        }

        tree
    }

    fn matches_extension(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_walk_collects_dirs_and_filtered_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/x.cs"), "").unwrap();
        fs::write(root.join("a/b/y.txt"), "").unwrap();

        let tree = TreeWalker::new(root)
            .with_extensions(&["cs".to_string()])
            .walk();

        assert_eq!(tree.dirs, vec![root.join("a"), root.join("a/b")]);
        assert_eq!(tree.files, vec![root.join("a/x.cs")]);
    }

    #[test]
    fn test_walk_respects_max_depth() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("one/two/three")).unwrap();

        let tree = TreeWalker::new(root).with_max_depth(2).walk();
        assert_eq!(tree.dirs, vec![root.join("one"), root.join("one/two")]);
    }

    #[test]
    fn test_walk_missing_root_is_empty() {
        let tree = TreeWalker::new("/definitely/not/here").walk();
        assert!(tree.dirs.is_empty());
        assert!(tree.files.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_does_not_follow_symlink_cycles() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("a")).unwrap();
        std::os::unix::fs::symlink(root, root.join("a/loop")).unwrap();

        let tree = TreeWalker::new(root).walk();
        assert_eq!(tree.dirs, vec![root.join("a")]);
    }
}
