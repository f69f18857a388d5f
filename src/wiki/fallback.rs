//! Deterministic placeholder documents.
//!
//! Used when generation fails for an aggregate or when the aggregate is
//! skipped. Output depends only on the inputs: no clock, no I/O.

use crate::types::Layer;

/// Marker line present in every fallback document
pub const FALLBACK_STATUS: &str = "**Status**: Not implemented";

/// Placeholder Markdown for one layer of one aggregate
pub fn fallback_content(context: &str, aggregate: &str, layer: Layer) -> String {
    let mut doc = String::new();

    doc.push_str(&format!("# {}: {}\n\n", title(layer), aggregate));
    doc.push_str(&format!(
        "> No {} Layer Found. Documentation for `{}` could not be generated; \
         the outline below lists what this layer is expected to contain.\n\n",
        layer, aggregate
    ));
    doc.push_str("## Expected Components\n\n");
    for item in expected_components(context, aggregate, layer) {
        doc.push_str(&format!("- {}\n", item));
    }
    doc.push_str("\n---\n\n");
    doc.push_str(&format!("**Bounded Context**: {}  \n", context));
    doc.push_str(&format!("**Aggregate**: {}  \n", aggregate));
    doc.push_str(FALLBACK_STATUS);
    doc.push('\n');
    doc
}

/// All six fallback documents in canonical layer order
pub fn fallback_bundle(context: &str, aggregate: &str) -> Vec<(Layer, String)> {
    Layer::ALL
        .iter()
        .map(|&layer| (layer, fallback_content(context, aggregate, layer)))
        .collect()
}

fn title(layer: Layer) -> &'static str {
    match layer {
        Layer::Application => "Application Layer",
        Layer::ChangeLog => "Change History",
        Layer::Domain => "Domain Model",
        Layer::Infrastructure => "Infrastructure",
        Layer::Quality => "Quality & Testing",
        Layer::WebUi => "Web UI",
    }
}

fn expected_components(context: &str, agg: &str, layer: Layer) -> Vec<String> {
    match layer {
        Layer::Application => vec![
            format!("`Create{agg}Command`, `Update{agg}Command`, `Delete{agg}Command` with validators and handlers"),
            format!("`Get{agg}Query` returning `{agg}Dto`"),
            "Application services orchestrating the use cases".to_string(),
        ],
        Layer::ChangeLog => vec![
            "Version history of the aggregate".to_string(),
            "Notable behavioral changes".to_string(),
            "Migration notes".to_string(),
        ],
        Layer::Domain => vec![
            format!("Entity `{agg}` in the `{context}` bounded context"),
            "Value Objects".to_string(),
            "Domain rules and invariants".to_string(),
            "Relations to other entities".to_string(),
        ],
        Layer::Infrastructure => vec![
            format!("`{agg}Configuration` mapping the `[{context}]` schema"),
            format!("`I{agg}Repository` and its implementation"),
            "External service integrations".to_string(),
        ],
        Layer::Quality => vec![
            format!("Unit tests for the `{agg}` commands and queries"),
            "Integration tests against persistence".to_string(),
            "Observability of validation failures".to_string(),
        ],
        Layer::WebUi => vec![
            format!("`{agg}Controller` in the `{context}` area"),
            format!("Create, edit and list endpoints for `{agg}`"),
            "Views or API contracts exposed to clients".to_string(),
        ],
    }
}
