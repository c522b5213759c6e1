//! Path validation.
//!
//! Every path handed to a backend is relative to that backend's root (the
//! pool directory, or the bucket prefix). Validation normalizes it and makes
//! sure it can never point outside that root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates and normalizes a backend-relative path.
///
/// `.` components and repeated or trailing separators are dropped, `..` is
/// resolved lexically and rejected once it would leave the root. Null bytes,
/// Windows prefixes and paths that normalize to nothing are rejected with
/// [`InvalidPath`](crate::error::ErrorKind::InvalidPath).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use mnemo_storage::validate_path;
///
/// assert_eq!(validate_path("001_two_sum.png").unwrap(), Path::new("001_two_sum.png"));
/// assert_eq!(validate_path("./images//001_two_sum.png").unwrap(), Path::new("images/001_two_sum.png"));
/// assert!(validate_path("../secrets.env").is_err());
/// assert!(validate_path("a\0b.png").is_err());
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes survive Path::components() on Unix but truncate
                // the path once it reaches a syscall.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(original.to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
    }
    Ok(components.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_pool_names() {
        assert_eq!(validate("001_two_sum.png").unwrap(), Path::new("001_two_sum.png"));
        assert_eq!(validate("141_linked_list_cycle_v2.png").unwrap(), Path::new("141_linked_list_cycle_v2.png"));
    }

    #[test]
    fn test_prefixed_remote_keys() {
        assert_eq!(validate("mnemonic-images/001_two_sum.png").unwrap(), Path::new("mnemonic-images/001_two_sum.png"));
        assert_eq!(validate("/mnemonic-images/").unwrap(), Path::new("mnemonic-images"));
    }

    #[test]
    fn test_normalization() {
        assert_eq!(validate("a//b/./c.png").unwrap(), Path::new("a/b/c.png"));
        assert_eq!(validate("a/b/..").unwrap(), Path::new("a"));
        assert_eq!(validate("images///").unwrap(), Path::new("images"));
    }

    #[test]
    fn test_escaping_root() {
        assert!(validate("../001_two_sum.png").is_err());
        assert!(validate("images/../../001_two_sum.png").is_err());
        assert!(validate("..").is_err());
    }

    #[test]
    fn test_rejected_input() {
        assert!(validate("001\0.png").is_err());
        assert!(validate("").is_err());
        assert!(validate(".").is_err());
        assert!(validate("./").is_err());
        assert!(validate("//").is_err());
    }

    #[test]
    fn test_error_kind() {
        let err = validate("../escape.png").unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(p) if p == Path::new("../escape.png")));
    }
}
