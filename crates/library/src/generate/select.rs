//! Picking which catalog entries still need an artifact.

use mnemo_catalog::Catalog;
use std::collections::HashSet;

/// Keys to generate in a run, or nothing at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Keys(Vec<u32>),
    NothingToDo,
}

/// Catalog keys split by whether their canonical artifact exists.
///
/// Both lists are in ascending key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub generated: Vec<u32>,
    pub missing: Vec<u32>,
}
impl Status {
    pub fn total(&self) -> usize {
        self.generated.len() + self.missing.len()
    }
}

/// Split every catalog key into generated and missing.
///
/// A key counts as generated only when the pool holds its canonical
/// (unversioned) filename. A lone `_v2` does not count.
pub fn status<S: AsRef<str>>(catalog: &Catalog, existing: impl IntoIterator<Item = S>) -> Status {
    let existing: Vec<S> = existing.into_iter().collect();
    let present: HashSet<&str> = existing.iter().map(AsRef::as_ref).collect();
    let mut status = Status::default();
    for entry in catalog.iter() {
        if present.contains(entry.filename.as_str()) {
            status.generated.push(entry.key);
        } else {
            status.missing.push(entry.key);
        }
    }
    status
}

/// Keys whose canonical filename is absent from `existing`, ascending.
///
/// # Examples
///
/// ```
/// use mnemo_catalog::{Catalog, CatalogEntry};
/// use mnemo_library::generate::list_missing;
///
/// let catalog = Catalog::from_entries([
///     CatalogEntry::new(1, "Two Sum"),
///     CatalogEntry::new(11, "Container With Most Water"),
///     CatalogEntry::new(70, "Climbing Stairs"),
/// ])
/// .unwrap();
/// let missing = list_missing(&catalog, ["011_container_with_most_water.png"]);
/// assert_eq!(missing, vec![1, 70]);
/// ```
pub fn list_missing<S: AsRef<str>>(catalog: &Catalog, existing: impl IntoIterator<Item = S>) -> Vec<u32> {
    status(catalog, existing).missing
}

/// The first `n` missing keys in ascending order.
pub fn select_batch<S: AsRef<str>>(catalog: &Catalog, existing: impl IntoIterator<Item = S>, n: usize) -> Selection {
    let mut missing = list_missing(catalog, existing);
    missing.truncate(n);
    if missing.is_empty() { Selection::NothingToDo } else { Selection::Keys(missing) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_catalog::CatalogEntry;
    use rstest::{fixture, rstest};

    #[fixture]
    fn catalog() -> Catalog {
        Catalog::from_entries([
            CatalogEntry::new(1, "Two Sum"),
            CatalogEntry::new(11, "Container With Most Water"),
            CatalogEntry::new(70, "Climbing Stairs"),
        ])
        .unwrap()
    }

    #[rstest]
    fn test_list_missing(catalog: Catalog) {
        assert_eq!(list_missing(&catalog, ["011_container_with_most_water.png"]), vec![1, 70]);
    }

    #[rstest]
    fn test_versioned_artifact_does_not_count(catalog: Catalog) {
        let existing = ["001_two_sum_v2.png", "notes.txt"];
        assert_eq!(list_missing(&catalog, existing), vec![1, 11, 70]);
    }

    #[rstest]
    fn test_status(catalog: Catalog) {
        let existing = vec!["070_climbing_stairs.png".to_string(), "001_two_sum.png".to_string()];
        let status = status(&catalog, &existing);
        assert_eq!(status.generated, vec![1, 70]);
        assert_eq!(status.missing, vec![11]);
        assert_eq!(status.total(), 3);
    }

    #[rstest]
    #[case(1, Selection::Keys(vec![1]))]
    #[case(2, Selection::Keys(vec![1, 70]))]
    #[case(5, Selection::Keys(vec![1, 70]))]
    #[case(0, Selection::NothingToDo)]
    fn test_select_batch(catalog: Catalog, #[case] n: usize, #[case] expected: Selection) {
        assert_eq!(select_batch(&catalog, ["011_container_with_most_water.png"], n), expected);
    }

    #[rstest]
    fn test_select_batch_nothing_to_do(catalog: Catalog) {
        let existing = ["001_two_sum.png", "011_container_with_most_water.png", "070_climbing_stairs.png"];
        assert_eq!(select_batch(&catalog, existing, 5), Selection::NothingToDo);
    }
}
