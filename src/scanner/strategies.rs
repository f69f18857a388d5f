//! Aggregate discovery strategies.
//!
//! Each strategy inspects a bounded context from a different angle and
//! returns raw candidates; cleanup happens afterwards on the union.

use regex::Regex;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

use super::ScanWarning;
use super::walk::WalkedTree;
use crate::config::ScannerConfig;

static NAMESPACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"namespace\s+([A-Za-z0-9_.]+)").expect("namespace pattern is valid")
});

/// Immediate, non-hidden subfolders of `<context>/<definitions>`.
pub fn definitions_candidates(
    context_root: &Path,
    config: &ScannerConfig,
    warnings: &mut Vec<ScanWarning>,
) -> Vec<String> {
    let definitions = context_root.join(&config.definitions_folder);
    if !definitions.is_dir() {
        return Vec::new();
    }

    let entries = match fs::read_dir(&definitions) {
        Ok(entries) => entries,
        Err(e) => {
            warnings.push(ScanWarning::UnreadableDirectory {
                path: definitions,
                reason: e.to_string(),
            });
            return Vec::new();
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| !name.starts_with('.'))
        .collect()
}

/// Folders below the context that contain a marker child (`Commands`,
/// `Queries`), excluding action folders and verb-named folders.
pub fn command_query_candidates(tree: &WalkedTree, config: &ScannerConfig) -> Vec<String> {
    tree.dirs
        .iter()
        .filter_map(|dir| {
            let name = dir.file_name()?.to_str()?;
            if is_action_folder(name, config) {
                return None;
            }
            let marked = config
                .marker_folders
                .iter()
                .any(|marker| dir.join(marker).is_dir());
            marked.then(|| name.to_string())
        })
        .collect()
}

/// Aggregate segments recovered from `namespace` declarations.
pub fn namespace_candidates(
    context_name: &str,
    files: &[PathBuf],
    config: &ScannerConfig,
    warnings: &mut Vec<ScanWarning>,
) -> Vec<String> {
    let mut found = Vec::new();

    for path in files {
        let head = match read_head(path, config.namespace_probe_bytes) {
            Ok(head) => head,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Skipping unreadable source file");
                warnings.push(ScanWarning::UnreadableFile {
                    path: path.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        // Only the first declaration in a file counts
        let Some(namespace) = NAMESPACE_RE.captures(&head).and_then(|caps| caps.get(1)) else {
            continue;
        };
        if let Some(aggregate) = aggregate_from_namespace(
            namespace.as_str(),
            &config.domain_root,
            context_name,
            &config.definitions_folder,
        ) {
            found.push(aggregate.to_string());
        }
    }

    found
}

/// Extract the aggregate segment from a dotted namespace.
///
/// `X.<domain_root>.<context>.<Agg>...` yields `Agg`, and
/// `X.<domain_root>.<context>.<definitions>.<Agg>...` also yields `Agg`.
/// A namespace for another context yields nothing.
pub fn aggregate_from_namespace<'a>(
    namespace: &'a str,
    domain_root: &str,
    context_name: &str,
    definitions_folder: &str,
) -> Option<&'a str> {
    let parts: Vec<&str> = namespace.split('.').collect();
    let idx = parts.iter().position(|p| *p == domain_root)?;

    if parts.get(idx + 1) != Some(&context_name) {
        return None;
    }

    let segment = *parts.get(idx + 2)?;
    let aggregate = if segment == definitions_folder {
        *parts.get(idx + 3)?
    } else {
        segment
    };

    (!aggregate.is_empty()).then_some(aggregate)
}

/// Folders that describe an action rather than an aggregate.
///
/// Any name starting with a verb prefix is an action, including words
/// such as `Address` that merely begin with one.
pub fn is_action_folder(name: &str, config: &ScannerConfig) -> bool {
    config.action_folders.iter().any(|a| a == name)
        || config
            .verb_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
}

fn read_head(path: &Path, limit: usize) -> std::io::Result<String> {
    let mut buf = Vec::with_capacity(limit);
    File::open(path)?
        .take(limit as u64)
        .read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::walk::TreeWalker;
    use tempfile::TempDir;

    fn config() -> ScannerConfig {
        ScannerConfig::default()
    }

    #[test]
    fn test_namespace_parsing() {
        let agg = |ns| aggregate_from_namespace(ns, "Application", "Sales", "Definitions");

        assert_eq!(agg("Acme.Application.Sales.Invoice.Commands"), Some("Invoice"));
        assert_eq!(agg("Acme.Application.Sales.Definitions.Order"), Some("Order"));
        assert_eq!(agg("Acme.Application.Sales.Definitions"), None);
        assert_eq!(agg("Acme.Application.Sales"), None);
        assert_eq!(agg("Acme.Application.HR.Employee"), None);
        assert_eq!(agg("Acme.Domain.Sales.Order"), None);
    }

    #[test]
    fn test_action_folder_detection() {
        let config = config();
        assert!(is_action_folder("Commands", &config));
        assert!(is_action_folder("CreateOrder", &config));
        assert!(is_action_folder("Get", &config));
        assert!(is_action_folder("Address", &config));
        assert!(is_action_folder("Getaway", &config));
        assert!(is_action_folder("Removal", &config));
        assert!(!is_action_folder("Order", &config));
        assert!(!is_action_folder("Invoice", &config));
    }

    #[test]
    fn test_definitions_skips_hidden_and_files() {
        let temp = TempDir::new().unwrap();
        let ctx = temp.path();
        fs::create_dir_all(ctx.join("Definitions/Employee")).unwrap();
        fs::create_dir_all(ctx.join("Definitions/.git")).unwrap();
        fs::write(ctx.join("Definitions/readme.md"), "").unwrap();

        let mut warnings = Vec::new();
        let found = definitions_candidates(ctx, &config(), &mut warnings);
        assert_eq!(found, vec!["Employee".to_string()]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_command_query_excludes_verb_folders() {
        let temp = TempDir::new().unwrap();
        let ctx = temp.path();
        fs::create_dir_all(ctx.join("CreateOrder/Commands")).unwrap();
        fs::create_dir_all(ctx.join("Order/Queries")).unwrap();
        fs::create_dir_all(ctx.join("Notes")).unwrap();
        fs::write(ctx.join("Notes/Commands"), "not a dir").unwrap();

        let tree = TreeWalker::new(ctx).walk();
        let found = command_query_candidates(&tree, &config());
        assert_eq!(found, vec!["Order".to_string()]);
    }

    #[test]
    fn test_namespace_probe_reads_only_head() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Late.cs");
        let padding = " ".repeat(4096);
        fs::write(
            &file,
            format!("{padding}namespace Acme.Application.Sales.Invoice;"),
        )
        .unwrap();

        let mut warnings = Vec::new();
        let found = namespace_candidates("Sales", &[file], &config(), &mut warnings);
        assert!(found.is_empty());
    }

    #[test]
    fn test_namespace_first_declaration_only() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Both.cs");
        fs::write(
            &file,
            "namespace Acme.Application.Sales.Invoice {}\nnamespace Acme.Application.Sales.Receipt {}\n",
        )
        .unwrap();

        let mut warnings = Vec::new();
        let found = namespace_candidates("Sales", &[file], &config(), &mut warnings);
        assert_eq!(found, vec!["Invoice".to_string()]);
    }

    #[test]
    fn test_command_query_drops_verb_prefixed_words() {
        let temp = TempDir::new().unwrap();
        let ctx = temp.path();
        fs::create_dir_all(ctx.join("Address/Commands")).unwrap();
        fs::create_dir_all(ctx.join("Invoice/Commands")).unwrap();

        let tree = TreeWalker::new(ctx).walk();
        let found = command_query_candidates(&tree, &config());
        assert_eq!(found, vec!["Invoice".to_string()]);
    }

    #[test]
    fn test_namespace_unreadable_file_warns() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("Gone.cs");

        let mut warnings = Vec::new();
        let found = namespace_candidates("Sales", &[missing], &config(), &mut warnings);
        assert!(found.is_empty());
        assert!(matches!(warnings[0], ScanWarning::UnreadableFile { .. }));
    }
}
