//! Phase 1: materialize the documentation skeleton.
//!
//! Creates every directory, order manifest and empty layer file before any
//! generation call. Re-running is safe: existing layer files are never
//! touched and manifests are only rewritten when their content changed.

use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, instrument};

use super::layout::{OutputLayout, layer_manifest, render_manifest};
use crate::types::{BoundedContext, Layer, Result, WikiError};

/// Counts of what a skeleton pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkeletonReport {
    pub manifests_written: usize,
    pub files_created: usize,
    pub files_kept: usize,
}

pub struct SkeletonBuilder {
    layout: OutputLayout,
}

impl SkeletonBuilder {
    pub fn new(layout: OutputLayout) -> Self {
        Self { layout }
    }

    #[instrument(skip_all, fields(output = %self.layout.root().display(), contexts = contexts.len()))]
    pub fn build(&self, contexts: &[BoundedContext]) -> Result<SkeletonReport> {
        let mut report = SkeletonReport::default();

        let contexts_dir = self.layout.contexts_dir();
        fs::create_dir_all(&contexts_dir).map_err(|e| WikiError::OutputNotWritable {
            path: self.layout.root().to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut context_names: Vec<&str> = contexts.iter().map(|c| c.name.as_str()).collect();
        context_names.sort_unstable();
        write_manifest(&contexts_dir, &render_manifest(&context_names), &mut report)?;

        for context in contexts {
            let context_dir = self.layout.context_dir(&context.name);
            fs::create_dir_all(&context_dir)?;
            let mut aggregates: Vec<&str> = context.aggregates.iter().map(String::as_str).collect();
            aggregates.sort_unstable();
            write_manifest(&context_dir, &render_manifest(&aggregates), &mut report)?;

            for aggregate in &context.aggregates {
                let aggregate_dir = self.layout.aggregate_dir(&context.name, aggregate);
                fs::create_dir_all(&aggregate_dir)?;
                write_manifest(&aggregate_dir, &layer_manifest(), &mut report)?;

                for layer in Layer::ALL {
                    let path = self.layout.layer_file(&context.name, aggregate, layer);
                    match OpenOptions::new().write(true).create_new(true).open(&path) {
                        Ok(_) => report.files_created += 1,
                        Err(e) if e.kind() == ErrorKind::AlreadyExists => report.files_kept += 1,
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }

        info!(
            manifests = report.manifests_written,
            created = report.files_created,
            kept = report.files_kept,
            "Skeleton ready"
        );
        Ok(report)
    }
}

fn write_manifest(dir: &Path, content: &str, report: &mut SkeletonReport) -> Result<()> {
    let path = OutputLayout::order_file(dir);
    if fs::read_to_string(&path).is_ok_and(|existing| existing == content) {
        return Ok(());
    }
    fs::write(&path, content)?;
    debug!(path = %path.display(), "Wrote order manifest");
    report.manifests_written += 1;
    Ok(())
}
