//! Exclusion filter
//!
//! Decides whether a candidate domain makes it into the output. Two stages run
//! in order:
//!
//! 1. [`PreFilter`]: literal checks for artifacts some feeds are known to
//!    emit that are not domains at all.
//! 2. [`Allowlist`]: a domain is dropped if it equals an allowlist entry or an
//!    entry is a suffix of it aligned on label boundaries. Allowlisting
//!    `example.com` drops `ads.example.com` but keeps `evilexample.com` and
//!    `example.com.attacker.net`.
//!
//! Comparison is case-sensitive; names are matched exactly as spelled.

use std::collections::HashMap;

use crate::domain::reversed_labels;

// =============================================================================
// Malformed Pre-filter
// =============================================================================

/// A literal pattern identifying a malformed feed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedRule {
    Contains(&'static str),
    EndsWith(&'static str),
}

impl MalformedRule {
    #[inline]
    pub fn matches(&self, domain: &str) -> bool {
        match self {
            MalformedRule::Contains(needle) => domain.contains(needle),
            MalformedRule::EndsWith(suffix) => domain.ends_with(suffix),
        }
    }
}

/// Artifacts seen in upstream feeds.
pub const DEFAULT_MALFORMED_RULES: &[MalformedRule] = &[
    MalformedRule::Contains("\"(t.co)\""),
    MalformedRule::EndsWith("\""),
];

#[derive(Debug, Clone)]
pub struct PreFilter {
    rules: Vec<MalformedRule>,
}

impl Default for PreFilter {
    fn default() -> Self {
        Self {
            rules: DEFAULT_MALFORMED_RULES.to_vec(),
        }
    }
}

impl PreFilter {
    /// A pre-filter with no rules.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: MalformedRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn is_malformed(&self, domain: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(domain))
    }
}

// =============================================================================
// Allowlist Trie
// =============================================================================

#[derive(Debug, Default)]
struct LabelNode {
    children: HashMap<String, LabelNode>,
    /// An allowlist entry ends at this node.
    terminal: bool,
}

/// Allowlist keyed on reversed labels.
///
/// `ads.example.com` is stored as the path `com -> example -> ads`. A lookup
/// walks the candidate's reversed labels and stops at the first terminal
/// node, so the cost is bounded by the candidate's label count rather than
/// the allowlist size.
#[derive(Debug, Default)]
pub struct Allowlist {
    root: LabelNode,
    len: usize,
}

impl Allowlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. Returns `false` if it was already present.
    pub fn insert(&mut self, entry: &str) -> bool {
        let mut node = &mut self.root;
        for label in reversed_labels(entry) {
            node = node.children.entry(label.to_string()).or_default();
        }
        if node.terminal {
            return false;
        }
        node.terminal = true;
        self.len += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check whether `domain` equals an entry or falls under one.
    pub fn covers(&self, domain: &str) -> bool {
        let mut node = &self.root;
        for label in reversed_labels(domain) {
            match node.children.get(label) {
                Some(child) => {
                    if child.terminal {
                        return true;
                    }
                    node = child;
                }
                None => return false,
            }
        }
        false
    }
}

impl<S: AsRef<str>> FromIterator<S> for Allowlist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut allowlist = Allowlist::new();
        for entry in iter {
            allowlist.insert(entry.as_ref());
        }
        allowlist
    }
}

// =============================================================================
// Combined Filter
// =============================================================================

/// Outcome of running a candidate through the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Malformed,
    Allowlisted,
}

#[derive(Debug, Default)]
pub struct ExclusionFilter {
    prefilter: PreFilter,
    allowlist: Allowlist,
}

impl ExclusionFilter {
    pub fn new(prefilter: PreFilter, allowlist: Allowlist) -> Self {
        Self {
            prefilter,
            allowlist,
        }
    }

    /// Filter with the default malformed rules and the given allowlist.
    pub fn with_allowlist<S: AsRef<str>>(entries: impl IntoIterator<Item = S>) -> Self {
        Self::new(PreFilter::default(), entries.into_iter().collect())
    }

    pub fn allowlist(&self) -> &Allowlist {
        &self.allowlist
    }

    pub fn verdict(&self, domain: &str) -> Verdict {
        if self.prefilter.is_malformed(domain) {
            log::debug!("dropping malformed entry {:?}", domain);
            return Verdict::Malformed;
        }
        if self.allowlist.covers(domain) {
            return Verdict::Allowlisted;
        }
        Verdict::Keep
    }

    #[inline]
    pub fn includes(&self, domain: &str) -> bool {
        self.verdict(domain) == Verdict::Keep
    }
}
