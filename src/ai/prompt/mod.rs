//! Prompt Builder System
//!
//! Standardized prompt construction for layer documentation requests.
//! Sections render in insertion order so identical inputs produce
//! identical prompts.

use std::fmt::Write;

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Role definition with expertise area
    Role { expertise: String, task: String },
    /// Numbered objectives
    Objectives(Vec<String>),
    /// Key-value pairs, rendered in insertion order
    Context(Vec<(String, String)>),
    /// Raw text section with optional header
    Text {
        header: Option<String>,
        content: String,
    },
    /// Code block with language and optional caption
    Code {
        caption: Option<String>,
        language: String,
        content: String,
    },
    /// Focus enforcement with restrictions
    Focus {
        target: String,
        restrictions: Vec<String>,
    },
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role definition section
    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    pub fn objectives<S: AsRef<str>>(mut self, objectives: &[S]) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.iter().map(|o| o.as_ref().to_string()).collect(),
        ));
        self
    }

    /// Add a context item; items share one context section
    pub fn context_item(mut self, key: &str, value: &str) -> Self {
        let existing = self.sections.iter_mut().find_map(|section| match section {
            PromptSection::Context(items) => Some(items),
            _ => None,
        });
        match existing {
            Some(items) => items.push((key.to_string(), value.to_string())),
            None => self.sections.push(PromptSection::Context(vec![(
                key.to_string(),
                value.to_string(),
            )])),
        }
        self
    }

    pub fn text(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: None,
            content: content.to_string(),
        });
        self
    }

    /// Add text section with header
    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    /// Add a code block captioned with its source path
    pub fn code(mut self, caption: Option<&str>, language: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Code {
            caption: caption.map(str::to_string),
            language: language.to_string(),
            content: content.to_string(),
        });
        self
    }

    /// Add focus enforcement section
    pub fn focus<S: AsRef<str>>(mut self, target: &str, restrictions: &[S]) -> Self {
        self.sections.push(PromptSection::Focus {
            target: target.to_string(),
            restrictions: restrictions.iter().map(|r| r.as_ref().to_string()).collect(),
        });
        self
    }

    /// Render every section in insertion order
    pub fn build(self) -> String {
        let mut prompt = String::new();
        for section in &self.sections {
            section.render(&mut prompt);
        }
        prompt.trim_end().to_string()
    }
}

impl PromptSection {
    // Writing into a String cannot fail
    fn render(&self, out: &mut String) {
        match self {
            Self::Role { expertise, task } => {
                let _ = write!(
                    out,
                    "<ROLE>\nYou are an expert {expertise} specializing in {task}.\n</ROLE>\n\n"
                );
            }
            Self::Objectives(items) => {
                out.push_str("<OBJECTIVES>\n");
                for (n, item) in items.iter().enumerate() {
                    let _ = writeln!(out, "{}. {item}", n + 1);
                }
                out.push_str("</OBJECTIVES>\n\n");
            }
            Self::Context(items) => {
                out.push_str("# Context\n\n");
                for (key, value) in items {
                    let _ = writeln!(out, "**{key}**: {value}");
                }
                out.push('\n');
            }
            Self::Text { header, content } => {
                if let Some(header) = header {
                    let _ = write!(out, "# {header}\n\n");
                }
                let _ = write!(out, "{content}\n\n");
            }
            Self::Code {
                caption,
                language,
                content,
            } => {
                if let Some(caption) = caption {
                    let _ = write!(out, "## {caption}\n\n");
                }
                let _ = write!(out, "```{language}\n{content}\n```\n\n");
            }
            Self::Focus {
                target,
                restrictions,
            } => {
                let _ = writeln!(out, "<FOCUS>\nIMPORTANT: Focus EXCLUSIVELY on: {target}");
                for rule in restrictions {
                    let _ = writeln!(out, "- {rule}");
                }
                out.push_str("</FOCUS>\n\n");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_prompt() {
        let prompt = PromptBuilder::new()
            .role("code analyst", "DDD documentation")
            .objectives(&["Analyze code", "Generate docs"])
            .build();

        assert!(prompt.contains("<ROLE>"));
        assert!(prompt.contains("code analyst"));
        assert!(prompt.contains("1. Analyze code"));
        assert!(prompt.contains("2. Generate docs"));
    }

    #[test]
    fn test_context_items_keep_order() {
        let prompt = PromptBuilder::new()
            .context_item("Bounded Context", "Sales")
            .context_item("Aggregate", "Order")
            .build();

        let bc = prompt.find("**Bounded Context**: Sales").unwrap();
        let agg = prompt.find("**Aggregate**: Order").unwrap();
        assert!(bc < agg);
        assert_eq!(prompt.matches("# Context").count(), 1);
    }

    #[test]
    fn test_code_block_caption() {
        let prompt = PromptBuilder::new()
            .code(Some("Application/Sales/Order.cs"), "csharp", "class Order {}")
            .build();

        assert!(prompt.contains("## Application/Sales/Order.cs"));
        assert!(prompt.contains("```csharp\nclass Order {}\n```"));
    }

    #[test]
    fn test_focus_section() {
        let prompt = PromptBuilder::new()
            .focus("Order", &["Do NOT speculate"])
            .build();

        assert!(prompt.contains("<FOCUS>"));
        assert!(prompt.contains("- Do NOT speculate"));
    }
}
