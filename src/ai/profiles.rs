//! Per-layer documentation profiles.
//!
//! Every layer maps to one immutable profile; the generator reads the
//! profile to build the system instructions and the focus section of the
//! prompt.

use crate::types::Layer;

/// How a single layer is documented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerProfile {
    pub layer: Layer,
    /// Display name used in logs
    pub agent: &'static str,
    pub focus: &'static [&'static str],
    pub instructions: &'static str,
}

static PROFILES: [LayerProfile; Layer::COUNT] = [
    LayerProfile {
        layer: Layer::Application,
        agent: "application-analyst",
        focus: &[
            "application services",
            "command handlers",
            "query handlers",
            "DTOs",
        ],
        instructions: "Document the application layer responsibilities of the aggregate: \
            the use cases it exposes, how commands and queries flow, and which DTOs cross the boundary.",
    },
    LayerProfile {
        layer: Layer::ChangeLog,
        agent: "changelog-writer",
        focus: &["recent changes", "version history", "notable updates"],
        instructions: "Write a change history for the aggregate. \
            Only list changes that can be inferred from the provided code; say so when none can.",
    },
    LayerProfile {
        layer: Layer::Domain,
        agent: "domain-modeler",
        focus: &[
            "entities",
            "value objects",
            "domain services",
            "business rules",
        ],
        instructions: "Document the domain model of the aggregate: its root entity, \
            value objects, invariants and the business rules it enforces.",
    },
    LayerProfile {
        layer: Layer::Infrastructure,
        agent: "infrastructure-analyst",
        focus: &["repositories", "external integrations", "data access"],
        instructions: "Document how the aggregate is persisted and which external systems it talks to.",
    },
    LayerProfile {
        layer: Layer::Quality,
        agent: "quality-reviewer",
        focus: &[
            "unit tests",
            "integration tests",
            "coverage",
            "quality metrics",
        ],
        instructions: "Assess the test coverage and code quality of the aggregate \
            and list concrete gaps worth addressing.",
    },
    LayerProfile {
        layer: Layer::WebUi,
        agent: "webui-analyst",
        focus: &["controllers", "views", "API endpoints", "user interfaces"],
        instructions: "Document the endpoints and screens that expose the aggregate to users.",
    },
];

impl LayerProfile {
    pub fn for_layer(layer: Layer) -> &'static LayerProfile {
        &PROFILES[layer.index()]
    }

    /// Full system prompt for this layer
    pub fn system_prompt(&self) -> String {
        format!(
            "You are a .NET domain-driven design expert writing the {} documentation of one aggregate. \
             {} Respond with concise Markdown (at most 500 words) and nothing else. \
             If the layer does not exist in the code, briefly explain what would typically be found there.",
            self.layer, self.instructions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_table_matches_layer_order() {
        for layer in Layer::ALL {
            assert_eq!(LayerProfile::for_layer(layer).layer, layer);
        }
    }

    #[test]
    fn test_system_prompt_names_layer() {
        let prompt = LayerProfile::for_layer(Layer::Domain).system_prompt();
        assert!(prompt.contains("Domain documentation"));
        assert!(prompt.contains("business rules"));
    }

    #[test]
    fn test_every_profile_has_focus() {
        assert!(PROFILES.iter().all(|p| !p.focus.is_empty()));
    }
}
