//! Domain name canonicalization and label handling
//!
//! Domains are kept exactly as the upstream feeds spell them. The only
//! normalization applied is removing a single trailing dot, so
//! `ads.example.com.` and `ads.example.com` collapse to the same entry.
//!
//! # Examples
//!
//! ```
//! use adhosts_core::domain::{canonicalize, reversed_labels};
//!
//! assert_eq!(canonicalize("ads.example.com."), "ads.example.com");
//! let labels: Vec<&str> = reversed_labels("ads.example.com").collect();
//! assert_eq!(labels, ["com", "example", "ads"]);
//! ```

/// Strip exactly one trailing dot. No case folding is performed.
#[inline]
pub fn canonicalize(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// Canonicalize and reject names that end up empty.
///
/// Every parser and loader goes through this before inserting, since an empty
/// name would render as the root zone.
#[inline]
pub fn canonical_entry(name: &str) -> Option<&str> {
    let name = canonicalize(name);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Labels of `name` from the rightmost (nominally the TLD) to the leftmost.
#[inline]
pub fn reversed_labels(name: &str) -> impl Iterator<Item = &str> {
    name.split('.').rev()
}

/// Number of dot-separated labels in `name`.
#[inline]
pub fn label_count(name: &str) -> usize {
    name.split('.').count()
}

/// Check whether `suffix` equals `name` or is a suffix of it aligned on label
/// boundaries.
///
/// `example.com` is a label suffix of `ads.example.com` but not of
/// `evilexample.com`.
pub fn is_label_suffix(name: &str, suffix: &str) -> bool {
    if name == suffix {
        return true;
    }
    if label_count(suffix) > label_count(name) {
        return false;
    }
    reversed_labels(name)
        .zip(reversed_labels(suffix))
        .all(|(a, b)| a == b)
}
