//! Related source files for an aggregate.
//!
//! Searches the bounded-context folder first, then repository-level roots
//! such as `Domain/` and `Infrastructure/`, keeping the first matches in
//! walk order up to a fixed file budget.

use glob::{MatchOptions, Pattern};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{ScannerConfig, SnippetConfig};
use crate::scanner::TreeWalker;
use crate::types::SourceSnippet;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

pub struct SnippetCollector {
    repo_root: PathBuf,
    extra_roots: Vec<PathBuf>,
    extensions: Vec<String>,
    definitions_folder: String,
    max_files: usize,
    max_chars: usize,
    max_depth: usize,
}

impl SnippetCollector {
    pub fn new(repo_root: &Path, snippets: &SnippetConfig, scanner: &ScannerConfig) -> Self {
        Self {
            repo_root: repo_root.to_path_buf(),
            extra_roots: snippets
                .extra_roots
                .iter()
                .map(|r| repo_root.join(r))
                .collect(),
            extensions: scanner.source_extensions.clone(),
            definitions_folder: scanner.definitions_folder.clone(),
            max_files: snippets.max_files,
            max_chars: snippets.max_chars,
            max_depth: scanner.max_depth,
        }
    }

    /// Up to `max_files` snippets mentioning `aggregate`, context folder first
    pub fn collect(&self, context_root: &Path, aggregate: &str) -> Vec<SourceSnippet> {
        let patterns = self.patterns(aggregate);
        if patterns.is_empty() || self.max_files == 0 {
            return Vec::new();
        }

        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut snippets = Vec::new();

        let roots = std::iter::once(context_root.to_path_buf()).chain(self.extra_roots.iter().cloned());
        for root in roots {
            let tree = TreeWalker::new(&root)
                .with_max_depth(self.max_depth)
                .with_extensions(&self.extensions)
                .walk();

            for file in tree.files {
                if snippets.len() >= self.max_files {
                    return snippets;
                }

                let Ok(relative) = file.strip_prefix(&root) else {
                    continue;
                };
                let relative = slash_path(relative);
                if !patterns.iter().any(|p| p.matches_with(&relative, MATCH_OPTIONS)) {
                    continue;
                }
                if !seen.insert(file.clone()) {
                    continue;
                }

                match fs::read(&file) {
                    Ok(bytes) => {
                        let text = String::from_utf8_lossy(&bytes);
                        snippets.push(SourceSnippet {
                            path: self.display_path(&file),
                            content: text.chars().take(self.max_chars).collect(),
                        });
                    }
                    Err(e) => debug!(path = %file.display(), error = %e, "Skipping unreadable snippet"),
                }
            }
        }

        snippets
    }

    fn patterns(&self, aggregate: &str) -> Vec<Pattern> {
        let agg = Pattern::escape(aggregate);
        let defs = Pattern::escape(&self.definitions_folder);

        self.extensions
            .iter()
            .flat_map(|ext| {
                [
                    format!("**/*{agg}*.{ext}"),
                    format!("**/{defs}/{agg}/**/*.{ext}"),
                    format!("**/{agg}/**/*.{ext}"),
                ]
            })
            .filter_map(|raw| match Pattern::new(&raw) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!(pattern = %raw, error = %e, "Invalid snippet pattern");
                    None
                }
            })
            .collect()
    }

    fn display_path(&self, file: &Path) -> String {
        file.strip_prefix(&self.repo_root)
            .map(slash_path)
            .unwrap_or_else(|_| file.display().to_string())
    }
}

fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn collector(root: &Path, max_files: usize, max_chars: usize) -> SnippetCollector {
        let snippets = SnippetConfig {
            max_files,
            max_chars,
            ..SnippetConfig::default()
        };
        SnippetCollector::new(root, &snippets, &ScannerConfig::default())
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_matches_name_and_folder_patterns() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "Application/Sales/Order/Commands/Place.cs", "place");
        write(root, "Application/Sales/Shared/OrderDto.cs", "dto");
        write(root, "Application/Sales/Invoice/Invoice.cs", "invoice");
        write(root, "Domain/Sales/Order.cs", "entity");
        write(root, "Infrastructure/Notes.txt", "Order");

        let found = collector(root, 10, 2000).collect(&root.join("Application/Sales"), "Order");
        let paths: Vec<&str> = found.iter().map(|s| s.path.as_str()).collect();

        assert_eq!(
            paths,
            vec![
                "Application/Sales/Order/Commands/Place.cs",
                "Application/Sales/Shared/OrderDto.cs",
                "Domain/Sales/Order.cs",
            ]
        );
    }

    #[test]
    fn test_limits_files_and_chars() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for i in 0..5 {
            write(root, &format!("Application/HR/Employee{i}.cs"), "abcdefgh");
        }

        let found = collector(root, 3, 4).collect(&root.join("Application/HR"), "Employee");
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|s| s.content == "abcd"));
    }

    #[test]
    fn test_glob_metacharacters_escaped() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "Application/HR/Other.cs", "x");

        let found = collector(root, 10, 100).collect(&root.join("Application/HR"), "*");
        assert!(found.is_empty());
    }
}
