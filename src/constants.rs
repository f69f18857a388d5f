//! Global Constants
//!
//! Centralized defaults for scanning, generation and the backend transport.
//! Configuration defaults are built from these values.

/// Structure scanner defaults
pub mod scanner {
    /// Folder under the repository root whose children are bounded contexts
    pub const DOMAIN_ROOT: &str = "Application";

    /// Folder whose immediate children are aggregates
    pub const DEFINITIONS_FOLDER: &str = "Definitions";

    /// Generic folders that never form a bounded context
    pub const CONTEXT_DENY_LIST: &[&str] = &[
        "Common",
        "Shared",
        "Base",
        "Core",
        "Extensions",
        "Interfaces",
        "Abstractions",
        "Constants",
    ];

    /// Folder names that are never aggregates themselves
    pub const ACTION_FOLDERS: &[&str] = &["Commands", "Queries", "Handlers"];

    /// Child folders that mark their parent as an aggregate
    pub const MARKER_FOLDERS: &[&str] = &["Commands", "Queries"];

    /// Verb prefixes of action folders such as `CreateOrder`
    pub const VERB_PREFIXES: &[&str] = &["Create", "Update", "Delete", "Get", "Add", "Remove"];

    /// Technical names dropped during cleanup (compared lowercased)
    pub const NOISE_NAMES: &[&str] = &[
        "command",
        "query",
        "handler",
        "validator",
        "dto",
        "model",
        "service",
        "repository",
        "controller",
        "common",
        "base",
    ];

    /// Candidates of this length or shorter are dropped
    pub const MIN_NAME_LEN_EXCLUSIVE: usize = 2;

    /// Source file extensions inspected for namespace declarations
    pub const SOURCE_EXTENSIONS: &[&str] = &["cs"];

    /// Bytes read from the head of each source file when probing namespaces
    pub const NAMESPACE_PROBE_BYTES: usize = 2048;

    /// Maximum directory depth below a bounded context
    pub const MAX_DEPTH: usize = 32;
}

/// Relevant source snippet limits
pub mod snippets {
    /// Maximum files handed to the generator per aggregate
    pub const MAX_FILES: usize = 10;

    /// Maximum characters kept per file
    pub const MAX_CHARS: usize = 2000;

    /// Repository-level folders searched in addition to the context folder
    pub const EXTRA_ROOTS: &[&str] = &["Domain", "Infrastructure"];
}

/// Output layout
pub mod output {
    /// Default output folder, relative to the repository root
    pub const DEFAULT_DIR: &str = "Docs";

    /// Folder holding all bounded contexts
    pub const BOUNDED_CONTEXT_DIR: &str = "BoundedContext";

    /// Sidecar file listing a directory's children in presentation order
    pub const ORDER_FILE: &str = ".order";
}

/// Phase 2 orchestration defaults
pub mod generation {
    /// Concurrent aggregate tasks
    pub const MAX_CONCURRENCY: usize = 3;

    /// Outer wall-clock deadline per layer call (seconds).
    ///
    /// Must stay above the transport worst case for the default retry
    /// settings: 5 attempts x 180 s + 15 s of backoff.
    pub const LAYER_TIMEOUT_SECS: u64 = 960;
}

/// Retrying transport defaults
pub mod retry {
    /// Attempts per logical call, including the first one
    pub const MAX_ATTEMPTS: u32 = 5;

    /// Base wait in seconds; attempt `n` waits `multiplier * 2^(n-1)`
    pub const MULTIPLIER: f64 = 1.0;

    /// Cap on a single backoff wait (seconds)
    pub const MAX_WAIT_PER_ATTEMPT_SECS: u64 = 60;

    /// Cap on cumulative backoff across one logical call (seconds)
    pub const MAX_TOTAL_WAIT_SECS: u64 = 300;

    /// Jitter is drawn from `[0, wait / JITTER_DIVISOR)`
    pub const JITTER_DIVISOR: u64 = 4;
}

/// HTTP/LLM constants
pub mod network {
    /// Default per-request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

    /// Default completion budget
    pub const DEFAULT_MAX_TOKENS: usize = 8192;

    /// Default OpenAI-compatible endpoint
    pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

    /// Default model
    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
}
