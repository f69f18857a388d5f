//! Repository structure scanner.
//!
//! Discovers bounded contexts (immediate children of the domain root) and
//! the aggregates inside each one. Aggregates come from three strategies
//! whose candidates are merged and cleaned:
//!
//! - `Definitions/<Agg>` folders
//! - folders holding `Commands/` or `Queries/` children
//! - `namespace X.<root>.<context>.<Agg>` declarations in source files
//!
//! Scanning is synchronous and read-only. Unreadable entries are reported
//! as [`ScanWarning`]s instead of aborting the scan.

mod normalize;
mod strategies;
mod walk;

pub use normalize::{normalize_aggregates, singularize};
pub use strategies::{aggregate_from_namespace, is_action_folder};
pub use walk::{TreeWalker, WalkedTree};

use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::config::ScannerConfig;
use crate::types::BoundedContext;

/// Non-fatal problems met while scanning
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanWarning {
    DomainRootMissing { path: PathBuf },
    UnreadableDirectory { path: PathBuf, reason: String },
    UnreadableFile { path: PathBuf, reason: String },
    Walk { context: String, reason: String },
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DomainRootMissing { path } => {
                write!(f, "domain root not found: {}", path.display())
            }
            Self::UnreadableDirectory { path, reason } => {
                write!(f, "cannot read directory {}: {}", path.display(), reason)
            }
            Self::UnreadableFile { path, reason } => {
                write!(f, "cannot read file {}: {}", path.display(), reason)
            }
            Self::Walk { context, reason } => write!(f, "walk error in {}: {}", context, reason),
        }
    }
}

/// Result of a full repository scan
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub contexts: Vec<BoundedContext>,
    pub warnings: Vec<ScanWarning>,
}

impl ScanReport {
    pub fn aggregate_count(&self) -> usize {
        self.contexts.iter().map(|c| c.aggregates.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

pub struct StructureScanner {
    repo_root: PathBuf,
    config: ScannerConfig,
}

impl StructureScanner {
    pub fn new<P: AsRef<Path>>(repo_root: P, config: ScannerConfig) -> Self {
        Self {
            repo_root: repo_root.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn domain_root(&self) -> PathBuf {
        self.repo_root.join(&self.config.domain_root)
    }

    /// Scan contexts and their aggregates. Repeated scans of an unchanged
    /// tree return identical reports.
    #[instrument(skip(self), fields(repo = %self.repo_root.display()))]
    pub fn scan(&self) -> ScanReport {
        let mut warnings = Vec::new();
        let mut contexts = self.discover_contexts(&mut warnings);

        for context in &mut contexts {
            context.aggregates = self.discover_aggregates(context, &mut warnings);
            debug!(
                context = %context.name,
                aggregates = context.aggregates.len(),
                "Discovered aggregates"
            );
        }

        info!(
            contexts = contexts.len(),
            aggregates = contexts.iter().map(|c| c.aggregates.len()).sum::<usize>(),
            warnings = warnings.len(),
            "Scan complete"
        );

        ScanReport { contexts, warnings }
    }

    /// Immediate subfolders of the domain root, minus hidden and generic ones.
    /// Returned sorted by name with empty aggregate lists.
    pub fn discover_contexts(&self, warnings: &mut Vec<ScanWarning>) -> Vec<BoundedContext> {
        let domain_root = self.domain_root();
        if !domain_root.is_dir() {
            warn!(path = %domain_root.display(), "Domain root not found");
            warnings.push(ScanWarning::DomainRootMissing { path: domain_root });
            return Vec::new();
        }

        let entries = match fs::read_dir(&domain_root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %domain_root.display(), error = %e, "Cannot read domain root");
                warnings.push(ScanWarning::UnreadableDirectory {
                    path: domain_root,
                    reason: e.to_string(),
                });
                return Vec::new();
            }
        };

        let mut contexts: Vec<BoundedContext> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                if name.starts_with('.') || self.config.context_deny_list.contains(&name) {
                    return None;
                }
                Some(BoundedContext::new(name, entry.path()))
            })
            .collect();

        contexts.sort_by(|a, b| a.name.cmp(&b.name));
        contexts
    }

    /// Union of all strategy candidates for one context, cleaned.
    pub fn discover_aggregates(
        &self,
        context: &BoundedContext,
        warnings: &mut Vec<ScanWarning>,
    ) -> Vec<String> {
        let tree = TreeWalker::new(&context.root_path)
            .with_max_depth(self.config.max_depth)
            .with_extensions(&self.config.source_extensions)
            .walk();

        for reason in &tree.errors {
            debug!(context = %context.name, %reason, "Walk error");
            warnings.push(ScanWarning::Walk {
                context: context.name.clone(),
                reason: reason.clone(),
            });
        }

        let mut candidates =
            strategies::definitions_candidates(&context.root_path, &self.config, warnings);
        candidates.extend(strategies::command_query_candidates(&tree, &self.config));
        candidates.extend(strategies::namespace_candidates(
            &context.name,
            &tree.files,
            &self.config,
            warnings,
        ));

        normalize_aggregates(candidates, &self.config.noise_names)
    }
}
