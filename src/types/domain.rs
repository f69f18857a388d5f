//! Domain model shared by the scanner, the skeleton builder and the
//! orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// =============================================================================
// Bounded Context
// =============================================================================

/// A top-level domain partition discovered under the domain root folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundedContext {
    pub name: String,
    pub root_path: PathBuf,
    /// Normalized aggregate names, unique (case-insensitive) and sorted
    pub aggregates: Vec<String>,
}

impl BoundedContext {
    pub fn new(name: impl Into<String>, root_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root_path: root_path.into(),
            aggregates: Vec::new(),
        }
    }

    pub fn with_aggregates(mut self, aggregates: Vec<String>) -> Self {
        self.aggregates = aggregates;
        self
    }
}

// =============================================================================
// Layer
// =============================================================================

/// One of the six documentation facets generated per aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Layer {
    Application,
    ChangeLog,
    Domain,
    Infrastructure,
    Quality,
    WebUi,
}

impl Layer {
    /// Total number of layers
    pub const COUNT: usize = 6;

    /// Canonical order, used both for generation and for the aggregate manifest
    pub const ALL: [Layer; Self::COUNT] = [
        Layer::Application,
        Layer::ChangeLog,
        Layer::Domain,
        Layer::Infrastructure,
        Layer::Quality,
        Layer::WebUi,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Layer::Application => "Application",
            Layer::ChangeLog => "ChangeLog",
            Layer::Domain => "Domain",
            Layer::Infrastructure => "Infrastructure",
            Layer::Quality => "Quality",
            Layer::WebUi => "WebUi",
        }
    }

    /// File name of the layer document inside an aggregate directory
    pub fn file_name(&self) -> String {
        format!("{}.md", self.name())
    }

    /// Position in the canonical order
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches(".md");
        Layer::ALL
            .iter()
            .copied()
            .find(|layer| layer.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                format!(
                    "Unknown layer: {}. Valid values: Application, ChangeLog, Domain, Infrastructure, Quality, WebUi",
                    s
                )
            })
    }
}

// =============================================================================
// Layer Document
// =============================================================================

/// Outcome of filling one layer file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerStatus {
    /// Content came from the generator
    Generated,
    /// Deterministic placeholder content was written
    Fallback,
    /// The file could not be persisted
    Error,
}

impl fmt::Display for LayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerStatus::Generated => write!(f, "generated"),
            LayerStatus::Fallback => write!(f, "fallback"),
            LayerStatus::Error => write!(f, "error"),
        }
    }
}

/// Content for one (aggregate, layer) pair, produced in Phase 2
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDocument {
    pub bounded_context: String,
    pub aggregate: String,
    pub layer: Layer,
    pub content: String,
    pub status: LayerStatus,
}

impl LayerDocument {
    pub fn new(
        bounded_context: impl Into<String>,
        aggregate: impl Into<String>,
        layer: Layer,
        content: impl Into<String>,
        status: LayerStatus,
    ) -> Self {
        Self {
            bounded_context: bounded_context.into(),
            aggregate: aggregate.into(),
            layer,
            content: content.into(),
            status,
        }
    }
}

/// A related source file handed to the generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSnippet {
    /// Path relative to the repository root, `/`-separated
    pub path: String,
    /// File head, truncated to the configured character limit
    pub content: String,
}

// =============================================================================
// Task State
// =============================================================================

/// Lifecycle of a per-aggregate generation task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Running,
    /// All six layers generated
    Completed,
    /// Whole aggregate replaced by fallback content
    FallenBack,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::FallenBack)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Pending => write!(f, "pending"),
            TaskState::Running => write!(f, "running"),
            TaskState::Completed => write!(f, "completed"),
            TaskState::FallenBack => write!(f, "fallen_back"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_canonical_order() {
        let names: Vec<&str> = Layer::ALL.iter().map(|l| l.name()).collect();
        assert_eq!(
            names,
            vec![
                "Application",
                "ChangeLog",
                "Domain",
                "Infrastructure",
                "Quality",
                "WebUi"
            ]
        );
        for (i, layer) in Layer::ALL.iter().enumerate() {
            assert_eq!(layer.index(), i);
        }
    }

    #[test]
    fn test_layer_parse() {
        assert_eq!("webui".parse::<Layer>().unwrap(), Layer::WebUi);
        assert_eq!("ChangeLog.md".parse::<Layer>().unwrap(), Layer::ChangeLog);
        assert!("Presentation".parse::<Layer>().is_err());
    }

    #[test]
    fn test_layer_file_name() {
        assert_eq!(Layer::Quality.file_name(), "Quality.md");
    }

    #[test]
    fn test_task_state_terminal() {
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::Running.is_terminal());
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::FallenBack.is_terminal());
    }
}
