use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::types::Layer;

/// Optional reference documents, one per layer
#[derive(Debug, Clone, Default)]
pub struct LayerTemplates {
    templates: HashMap<Layer, String>,
}

impl LayerTemplates {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load `<Layer>.md` files from `dir`.
    ///
    /// A missing directory or file leaves that template empty and logs a
    /// warning; loading never fails.
    pub fn load(dir: Option<&Path>) -> Self {
        let Some(dir) = dir else {
            return Self::empty();
        };

        if !dir.is_dir() {
            warn!(path = %dir.display(), "Template directory not found");
            return Self::empty();
        }

        let mut templates = HashMap::new();
        for layer in Layer::ALL {
            let path = dir.join(layer.file_name());
            match fs::read_to_string(&path) {
                Ok(content) => {
                    debug!(layer = %layer, "Loaded template");
                    templates.insert(layer, content);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Template not loaded");
                }
            }
        }

        info!(loaded = templates.len(), "Templates loaded");
        Self { templates }
    }

    /// Template text for `layer`, empty when none was loaded
    pub fn get(&self, layer: Layer) -> &str {
        self.templates.get(&layer).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_loads_present_templates() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("Domain.md"), "# Domain template").unwrap();

        let templates = LayerTemplates::load(Some(temp.path()));
        assert_eq!(templates.len(), 1);
        assert_eq!(templates.get(Layer::Domain), "# Domain template");
        assert_eq!(templates.get(Layer::WebUi), "");
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let templates = LayerTemplates::load(Some(Path::new("/no/such/templates")));
        assert!(templates.is_empty());
        assert!(LayerTemplates::load(None).is_empty());
    }
}
