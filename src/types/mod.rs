pub mod domain;
pub mod error;

pub use domain::{
    BoundedContext, Layer, LayerDocument, LayerStatus, SourceSnippet, TaskState,
};
pub use error::{
    ErrorCategory, ErrorClassifier, GenerationError, LlmError, Result, WikiError,
};
