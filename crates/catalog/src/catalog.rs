//! The fixed catalog of entries that artifacts are generated for.
//!
//! A catalog is a TOML document made of `[[entry]]` tables:
//!
//! ```toml
//! [[entry]]
//! key = 1
//! title = "Two Sum"
//! filename = "001_two_sum.png"     # optional, derived from key and title
//! punchline = "Have I seen my complement before?"
//! hint = "..."                      # optional
//! prompt = "..."                    # optional, bypasses the prompt template
//! ```
//!
//! A catalog compiled into the binary is used unless configuration points at
//! a replacement file.

use crate::error::{ErrorKind, Result};
use crate::naming;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Format, Toml};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::Path;
use tracing::instrument;

const BUILTIN_CATALOG: &str = include_str!("../resources/catalog.toml");

/// What the generation capability is asked to draw for an entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationSpec {
    /// One-line takeaway the image should make memorable.
    pub punchline: String,
    /// Longer explanation handed to the generator as context.
    pub hint: String,
    /// Verbatim prompt. When set, the prompt template is not used at all.
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub key: u32,
    pub title: String,
    /// Canonical, versionless filename of this entry's artifact.
    pub filename: String,
    pub generation: GenerationSpec,
}
impl CatalogEntry {
    /// An entry with a filename derived from its key and title.
    pub fn new(key: u32, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            key,
            filename: naming::canonical_filename(key, &title),
            title,
            generation: GenerationSpec::default(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_punchline(mut self, punchline: impl Into<String>) -> Self {
        self.generation.punchline = punchline.into();
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.generation.hint = hint.into();
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.generation.prompt = Some(prompt.into());
        self
    }

    fn validate(&self) -> Result<()> {
        match naming::parse(&self.filename) {
            Some(name) if name.key == self.key && name.is_base() => Ok(()),
            _ => exn::bail!(ErrorKind::InvalidFilename { key: self.key, filename: self.filename.clone() }),
        }
    }
}

#[derive(Deserialize)]
struct Document {
    #[serde(default, rename = "entry")]
    entries: Vec<DocumentEntry>,
}

#[derive(Deserialize)]
struct DocumentEntry {
    key: u32,
    title: String,
    filename: Option<String>,
    punchline: String,
    #[serde(default)]
    hint: String,
    prompt: Option<String>,
}
impl From<DocumentEntry> for CatalogEntry {
    fn from(raw: DocumentEntry) -> Self {
        let entry = CatalogEntry::new(raw.key, raw.title);
        let entry = match raw.filename {
            Some(filename) => entry.with_filename(filename),
            None => entry,
        };
        CatalogEntry {
            generation: GenerationSpec { punchline: raw.punchline, hint: raw.hint, prompt: raw.prompt },
            ..entry
        }
    }
}

/// Immutable, key-ordered set of catalog entries.
///
/// Every entry is validated on construction: keys are unique and each
/// filename parses back to its own key as a base artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: BTreeMap<u32, CatalogEntry>,
}
impl Catalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_toml(BUILTIN_CATALOG)
    }

    /// Parse a catalog from a TOML document.
    pub fn from_toml(document: &str) -> Result<Self> {
        let document: Document = Figment::from(Toml::string(document)).extract().or_raise(|| ErrorKind::Parse)?;
        Self::from_entries(document.entries.into_iter().map(CatalogEntry::from))
    }

    /// Load a catalog from a TOML file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
        let catalog = Self::from_toml(&document)?;
        tracing::debug!(entries = catalog.len(), "Loaded catalog");
        Ok(catalog)
    }

    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for entry in entries {
            entry.validate()?;
            match map.entry(entry.key) {
                Entry::Occupied(_) => exn::bail!(ErrorKind::DuplicateKey(entry.key)),
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                },
            }
        }
        Ok(Self { entries: map })
    }

    pub fn get(&self, key: u32) -> Option<&CatalogEntry> {
        self.entries.get(&key)
    }

    pub fn contains(&self, key: u32) -> bool {
        self.entries.contains_key(&key)
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> + '_ {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
