//! Catalog entries, the artifact filename codec, and prompt composition.

mod catalog;
pub mod error;
pub mod naming;
mod prompt;

pub use crate::catalog::{Catalog, CatalogEntry, GenerationSpec};
pub use crate::naming::{ArtifactName, VersionLabel};
pub use crate::prompt::{DEFAULT_PROMPT_TEMPLATE, PromptBuilder};
