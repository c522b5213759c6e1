//! Version resolution.
//!
//! A pool can hold several generations of the same artifact
//! (`005_x.png`, `005_x_v2.png`, ...). Resolution keeps exactly one per
//! key: the one with the highest version. Anything that does not parse as an
//! artifact name is set aside, never treated as an error.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use mnemo_catalog::ArtifactName;
use mnemo_catalog::naming::parse;
use mnemo_storage::BackendHandle;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// What a single pool filename turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    Resolved(ArtifactName),
    /// Not an artifact name; carries the name unchanged.
    Skipped(String),
}

pub fn classify(raw_name: &str) -> Classified {
    match parse(raw_name) {
        Some(name) => Classified::Resolved(name),
        None => Classified::Skipped(raw_name.to_string()),
    }
}

/// Latest artifact per key, plus every name that was ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub latest: BTreeMap<u32, ArtifactName>,
    /// Unparsable names, in input order.
    pub skipped: Vec<String>,
}
impl Resolution {
    pub fn get(&self, key: u32) -> Option<&ArtifactName> {
        self.latest.get(&key)
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    /// Raw filename of the latest artifact per key, ascending.
    pub fn targets(&self) -> BTreeMap<u32, String> {
        self.latest.iter().map(|(key, name)| (*key, name.raw_name.clone())).collect()
    }
}

/// Reduce `names` to one artifact per key.
///
/// The highest version wins. When two names share a key and a version (say
/// `005_a.png` and `005_b.png`) the one seen first is kept, which is why
/// [`list_pool`] sorts its output.
///
/// # Examples
///
/// ```
/// use mnemo_library::resolve;
///
/// let resolution = resolve(["005_x.png", "005_x_v3.png", "notes.txt", "005_x_v2.png"]);
/// assert_eq!(resolution.get(5).unwrap().raw_name, "005_x_v3.png");
/// assert_eq!(resolution.skipped, vec!["notes.txt"]);
/// ```
pub fn resolve<I, S>(names: I) -> Resolution
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut resolution = Resolution::default();
    for raw_name in names {
        match classify(raw_name.as_ref()) {
            Classified::Skipped(raw_name) => resolution.skipped.push(raw_name),
            Classified::Resolved(name) => match resolution.latest.entry(name.key) {
                Entry::Vacant(slot) => {
                    slot.insert(name);
                },
                Entry::Occupied(mut slot) => {
                    if name.version > slot.get().version {
                        slot.insert(name);
                    }
                },
            },
        }
    }
    resolution
}

/// Every top-level filename in the pool, sorted lexicographically.
///
/// Files in subdirectories come back with their relative path, which never
/// parses as an artifact name. A pool directory that does not exist yet
/// lists as empty.
pub async fn list_pool(pool: &BackendHandle) -> Result<Vec<String>> {
    let files = pool.list(None).await.or_raise(|| ErrorKind::Listing)?;
    let mut names: Vec<String> = files
        .iter()
        .filter_map(|file| {
            let name = file.name();
            if name.is_none() {
                tracing::debug!(path = %file.path.display(), "Ignoring non UTF-8 filename");
            }
            name.map(str::to_string)
        })
        .collect();
    names.sort();
    Ok(names)
}
