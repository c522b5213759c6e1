//! Artifact filename codec.
//!
//! Pool files are named `{key}_{slug}[_v{n}].png`, where `key` is the
//! zero-padded catalog key and the optional `_v{n}` suffix marks a
//! regenerated version. A file without a suffix is version 0, which sorts
//! below every explicit version.
//!
//! ```text
//! 001_two_sum.png                -> key 1,   version 0
//! 141_linked_list_cycle_v2.png   -> key 141, version 2
//! notes.txt                      -> not an artifact
//! ```

use crate::error::{Error, ErrorKind, Result};
use regex::Regex;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::LazyLock;

/// Fixed extension of every artifact.
pub const EXTENSION: &str = "png";

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// The slug is matched lazily so that a trailing `_v<digits>` is taken as the
// version suffix rather than as part of the slug. The slug is never empty,
// so `001_v2.png` is the base artifact of key 1 with slug `v2`.
regex!(ARTIFACT_NAME_REGEX, r"^(\d+)_(.+?)(?:_v(\d+))?\.png$");

/// A pool filename that parsed as an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactName {
    /// Catalog key the artifact belongs to.
    pub key: u32,
    /// 0 for the base artifact, otherwise the `_v<n>` suffix.
    pub version: u32,
    /// The filename exactly as found in the pool.
    pub raw_name: String,
}
impl ArtifactName {
    pub fn is_base(&self) -> bool {
        self.version == 0
    }
}
impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_name)
    }
}
impl AsRef<str> for ArtifactName {
    fn as_ref(&self) -> &str {
        &self.raw_name
    }
}

/// Parse a pool filename.
///
/// Returns `None` for anything that is not an artifact name: wrong
/// extension, no leading key, a path separator anywhere in the name, or a
/// key or version that does not fit in a `u32`. Callers treat `None` as
/// "ignore this file", never as an error.
///
/// # Examples
///
/// ```
/// use mnemo_catalog::naming::parse;
///
/// let name = parse("003_longest_substring_v3.png").unwrap();
/// assert_eq!((name.key, name.version), (3, 3));
/// assert_eq!(parse("001_two_sum.png").unwrap().version, 0);
/// assert!(parse("notes.txt").is_none());
/// ```
pub fn parse(raw_name: &str) -> Option<ArtifactName> {
    if raw_name.contains(['/', '\\']) {
        return None;
    }
    let captures = ARTIFACT_NAME_REGEX.captures(raw_name)?;
    let key = captures.get(1)?.as_str().parse().ok()?;
    let version = match captures.get(3) {
        Some(version) => version.as_str().parse().ok()?,
        None => 0,
    };
    Some(ArtifactName { key, version, raw_name: raw_name.to_string() })
}

/// Version label attached to regenerated artifacts, always rendered as
/// `v<N>` with `N >= 1`.
///
/// Parsing accepts `v2`, `V2` and a bare `2`. Anything that would not come
/// back out of [`parse`] as the same version is rejected, so labelled
/// filenames always round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionLabel(NonZeroU32);
impl VersionLabel {
    pub fn new(version: u32) -> Option<Self> {
        NonZeroU32::new(version).map(Self)
    }

    pub fn version(&self) -> u32 {
        self.0.get()
    }
}
impl FromStr for VersionLabel {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            exn::bail!(ErrorKind::InvalidLabel(s.to_string()));
        }
        match digits.parse::<u32>().ok().and_then(Self::new) {
            Some(label) => Ok(label),
            None => exn::bail!(ErrorKind::InvalidLabel(s.to_string())),
        }
    }
}
impl fmt::Display for VersionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Insert a version label immediately before the extension.
///
/// Without a label the canonical name is returned unchanged.
///
/// ```
/// use mnemo_catalog::naming::{apply_version, VersionLabel};
///
/// let v2: VersionLabel = "v2".parse().unwrap();
/// assert_eq!(apply_version("001_two_sum.png", Some(&v2)), "001_two_sum_v2.png");
/// assert_eq!(apply_version("001_two_sum.png", None), "001_two_sum.png");
/// ```
pub fn apply_version(canonical: &str, label: Option<&VersionLabel>) -> String {
    let Some(label) = label else {
        return canonical.to_string();
    };
    match canonical.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{label}.{ext}"),
        None => format!("{canonical}_{label}"),
    }
}

/// Canonical filename for a catalog entry that does not name one explicitly.
///
/// The key is zero-padded to three digits and the title is slugified with
/// underscores as separators.
///
/// ```
/// use mnemo_catalog::naming::canonical_filename;
///
/// assert_eq!(canonical_filename(70, "Climbing Stairs"), "070_climbing_stairs.png");
/// ```
pub fn canonical_filename(key: u32, title: &str) -> String {
    // Quotation marks would otherwise turn into stray separators.
    let marks = ['\'', '"', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '`'];
    let stripped: String = title.chars().filter(|c| !marks.contains(c)).collect();
    let slug = rslug::slugify!(&stripped).replace('-', "_");
    let slug = if slug.is_empty() { "untitled".to_string() } else { slug };
    format!("{key:03}_{slug}.{EXTENSION}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("001_two_sum.png", 1, 0)]
    #[case("005_x_v3.png", 5, 3)]
    #[case("141_linked_list_detection_v2.png", 141, 2)]
    #[case("1143_longest_common_subsequence.png", 1143, 0)]
    #[case("033_search_rotated_v10.png", 33, 10)]
    #[case("007_with_v_in_slug.png", 7, 0)]
    #[case("008_x_v0.png", 8, 0)]
    #[case("001_v2.png", 1, 0)]
    fn test_parse_valid(#[case] raw: &str, #[case] key: u32, #[case] version: u32) {
        let name = parse(raw).unwrap();
        assert_eq!(name.key, key);
        assert_eq!(name.version, version);
        assert_eq!(name.raw_name, raw);
    }

    #[rstest]
    #[case("notes.txt")]
    #[case("001_two_sum.jpg")]
    #[case("001_two_sum.PNG")]
    #[case("two_sum.png")]
    #[case("001.png")]
    #[case("001_.png")]
    #[case("_001_two_sum.png")]
    #[case("images/001_two_sum.png")]
    #[case(".partial-001_two_sum.png")]
    #[case("99999999999_overflow.png")]
    #[case("005_x_v99999999999.png")]
    #[case("")]
    fn test_parse_invalid(#[case] raw: &str) {
        assert_eq!(parse(raw), None);
    }

    #[rstest]
    #[case("v2", 2)]
    #[case("V3", 3)]
    #[case("4", 4)]
    #[case(" v12 ", 12)]
    fn test_label_valid(#[case] raw: &str, #[case] version: u32) {
        let label: VersionLabel = raw.parse().unwrap();
        assert_eq!(label.version(), version);
        assert_eq!(label.to_string(), format!("v{version}"));
    }

    #[rstest]
    #[case("v0")]
    #[case("0")]
    #[case("")]
    #[case("v")]
    #[case("test")]
    #[case("v2b")]
    #[case("-1")]
    fn test_label_invalid(#[case] raw: &str) {
        let err = raw.parse::<VersionLabel>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidLabel(_)));
    }

    #[test]
    fn test_apply_version_without_label_is_identity() {
        for name in ["001_two_sum.png", "053_maximum_subarray.png", "no_extension"] {
            assert_eq!(apply_version(name, None), name);
        }
    }

    #[rstest]
    #[case("001_two_sum.png", 2)]
    #[case("141_linked_list_cycle.png", 3)]
    #[case("1143_longest_common_subsequence.png", 17)]
    fn test_apply_version_round_trips(#[case] canonical: &str, #[case] version: u32) {
        let label = VersionLabel::new(version).unwrap();
        let versioned = apply_version(canonical, Some(&label));
        let parsed = parse(&versioned).unwrap();
        let base = parse(canonical).unwrap();
        assert_eq!(parsed.key, base.key);
        assert_eq!(parsed.version, version);
    }

    #[test]
    fn test_apply_version_without_extension() {
        let label = VersionLabel::new(2).unwrap();
        assert_eq!(apply_version("001_two_sum", Some(&label)), "001_two_sum_v2");
    }

    #[rstest]
    #[case(1, "Two Sum", "001_two_sum.png")]
    #[case(238, "Product of Array Except Self", "238_product_of_array_except_self.png")]
    #[case(53, "Maximum Subarray (Kadane's Algorithm)", "053_maximum_subarray_kadanes_algorithm.png")]
    #[case(1143, "Longest Common Subsequence", "1143_longest_common_subsequence.png")]
    #[case(9, "???", "009_untitled.png")]
    fn test_canonical_filename(#[case] key: u32, #[case] title: &str, #[case] expected: &str) {
        let name = canonical_filename(key, title);
        assert_eq!(name, expected);
        let parsed = parse(&name).unwrap();
        assert_eq!((parsed.key, parsed.version), (key, 0));
    }
}
