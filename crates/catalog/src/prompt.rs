//! Prompt composition for the generation capability.
//!
//! Prompts are rendered from an [upon] template. The template sees the
//! entry's `key`, `title`, `punchline` and `hint`:
//!
//! ```
//! use mnemo_catalog::{CatalogEntry, PromptBuilder};
//!
//! let builder: PromptBuilder = "{{ title }}: {{ punchline }}".parse().unwrap();
//! let entry = CatalogEntry::new(1, "Two Sum").with_punchline("Check the hash map!");
//! assert_eq!(builder.build(&entry).unwrap(), "Two Sum: Check the hash map!");
//! ```

use crate::catalog::CatalogEntry;
use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use std::str::FromStr;
use tracing::instrument;
use upon::{Engine, Template};

/// Instruction wrapped around every entry unless configuration replaces it.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"You are creating a VISUAL MNEMONIC to help someone remember this algorithm.

GOAL: Create ONE memorable image that captures the KEY INSIGHT. When someone sees this image,
they should instantly recall how the algorithm works.

GUIDELINES:
- Don't illustrate every step literally - focus on the CORE insight
- Make it visually memorable and distinctive
- Use the actual algorithm elements (arrays, pointers, nodes, etc.) but present them vividly
- Think about what made the "tortoise and hare" visual for cycle detection so memorable -
  it shows the actual mechanism (fast/slow pointers) in a vivid way

PROBLEM: {{ title }}
KEY PUNCHLINE: "{{ punchline }}"

DETAILED ALGORITHM EXPLANATION:
{{ hint }}

Now create a visual that captures this algorithm's key insight in a memorable way."#;

/// Renders generation prompts for catalog entries.
///
/// The template is compiled once, on construction, so syntax errors surface
/// before any entry is processed.
pub struct PromptBuilder {
    engine: Engine<'static>,
    template: Template<'static>,
}
impl FromStr for PromptBuilder {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let engine = Engine::new();
        let template = engine.compile(s.to_string()).or_raise(|| ErrorKind::Template)?;
        Ok(Self { engine, template })
    }
}
impl PromptBuilder {
    /// Builder for the configured template, or the default one.
    pub fn new(template: Option<&str>) -> Result<Self> {
        template.unwrap_or(DEFAULT_PROMPT_TEMPLATE).parse()
    }

    /// The prompt sent to the generation capability for `entry`.
    ///
    /// An entry's verbatim prompt wins over the template.
    #[instrument(level = "trace", skip_all, fields(key = entry.key))]
    pub fn build(&self, entry: &CatalogEntry) -> Result<String> {
        if let Some(prompt) = &entry.generation.prompt {
            return Ok(prompt.clone());
        }
        self.template
            .render(
                &self.engine,
                upon::value! {
                    key: entry.key,
                    title: &entry.title,
                    punchline: &entry.generation.punchline,
                    hint: &entry.generation.hint,
                },
            )
            .to_string()
            .or_raise(|| ErrorKind::Template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_sum() -> CatalogEntry {
        CatalogEntry::new(1, "Two Sum")
            .with_punchline("Have I seen my complement before?")
            .with_hint("Store every number in a hash map.")
    }

    #[test]
    fn test_default_template_compiles() {
        assert!(PromptBuilder::new(None).is_ok());
    }

    #[test]
    fn test_default_template_includes_entry() {
        let prompt = PromptBuilder::new(None).unwrap().build(&two_sum()).unwrap();
        assert!(prompt.starts_with("You are creating a VISUAL MNEMONIC"));
        assert!(prompt.contains("PROBLEM: Two Sum\n"));
        assert!(prompt.contains("KEY PUNCHLINE: \"Have I seen my complement before?\""));
        assert!(prompt.contains("Store every number in a hash map."));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_custom_template() {
        let builder = PromptBuilder::new(Some("#{{ key }} {{ title }}")).unwrap();
        assert_eq!(builder.build(&two_sum()).unwrap(), "#1 Two Sum");
    }

    #[test]
    fn test_prompt_override_bypasses_template() {
        let builder = PromptBuilder::new(None).unwrap();
        let entry = two_sum().with_prompt("A tortoise and a hare on a circular track.");
        assert_eq!(builder.build(&entry).unwrap(), "A tortoise and a hare on a circular track.");
    }

    #[test]
    fn test_invalid_template() {
        let err = PromptBuilder::new(Some("{{ title ")).err().unwrap();
        assert!(matches!(&*err, ErrorKind::Template));
    }

    #[test]
    fn test_unknown_variable_fails_at_render() {
        let builder = PromptBuilder::new(Some("{{ nonexistent }}")).unwrap();
        let err = builder.build(&two_sum()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Template));
    }
}
