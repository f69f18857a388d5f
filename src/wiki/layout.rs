//! Output tree addressing.
//!
//! ```text
//! <out>/BoundedContext/.order
//! <out>/BoundedContext/<BC>/.order
//! <out>/BoundedContext/<BC>/<Agg>/.order
//! <out>/BoundedContext/<BC>/<Agg>/<Layer>.md
//! ```

use std::path::{Path, PathBuf};

use crate::constants::output::{BOUNDED_CONTEXT_DIR, ORDER_FILE};
use crate::types::Layer;

/// Path arithmetic for the documentation tree
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new<P: AsRef<Path>>(output_root: P) -> Self {
        Self {
            root: output_root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn contexts_dir(&self) -> PathBuf {
        self.root.join(BOUNDED_CONTEXT_DIR)
    }

    pub fn context_dir(&self, context: &str) -> PathBuf {
        self.contexts_dir().join(context)
    }

    pub fn aggregate_dir(&self, context: &str, aggregate: &str) -> PathBuf {
        self.context_dir(context).join(aggregate)
    }

    pub fn layer_file(&self, context: &str, aggregate: &str, layer: Layer) -> PathBuf {
        self.aggregate_dir(context, aggregate).join(layer.file_name())
    }

    pub fn order_file(dir: &Path) -> PathBuf {
        dir.join(ORDER_FILE)
    }
}

/// Manifest body: one name per line, no trailing newline
pub fn render_manifest<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|n| n.as_ref())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Manifest for an aggregate directory, in canonical layer order
pub fn layer_manifest() -> String {
    render_manifest(&Layer::ALL.map(|l| l.name()))
}
