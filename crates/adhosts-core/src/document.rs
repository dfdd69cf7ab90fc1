//! Output document format
//!
//! One resolver-zone directive per kept domain:
//!
//! ```text
//! local-zone: "ads.example.com." always_nxdomain
//! ```
//!
//! Lines are sorted lexicographically so identical domain sets always render
//! to identical bytes.

use std::collections::BTreeSet;
use std::fmt::Write;

/// Directive prefix shared with the resolver-zone input grammar.
pub const ZONE_PREFIX: &str = "local-zone:";

/// Action appended to every line.
pub const ZONE_ACTION: &str = "always_nxdomain";

/// Render a single directive, newline-terminated.
pub fn render_line(domain: &str) -> String {
    format!("{} \"{}.\" {}\n", ZONE_PREFIX, domain, ZONE_ACTION)
}

/// Render the final domain set.
///
/// `BTreeSet` iteration is already sorted by byte value, so the output does
/// not depend on the order domains were collected in.
pub fn render(domains: &BTreeSet<String>) -> String {
    // "local-zone: \"" + ".\" always_nxdomain\n"
    let overhead = ZONE_PREFIX.len() + ZONE_ACTION.len() + 6;
    let capacity = domains.iter().map(|d| d.len() + overhead).sum();
    let mut out = String::with_capacity(capacity);

    for domain in domains {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{} \"{}.\" {}", ZONE_PREFIX, domain, ZONE_ACTION);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_render_line() {
        assert_eq!(
            render_line("bad.example"),
            "local-zone: \"bad.example.\" always_nxdomain\n"
        );
    }

    #[test]
    fn test_render_sorted() {
        let doc = render(&set(&["b.com", "a.com", "A.com"]));
        assert_eq!(
            doc,
            "local-zone: \"A.com.\" always_nxdomain\n\
             local-zone: \"a.com.\" always_nxdomain\n\
             local-zone: \"b.com.\" always_nxdomain\n"
        );
    }

    #[test]
    fn test_render_matches_render_line() {
        let domains = set(&["one.test", "two.test"]);
        let joined: String = domains.iter().map(|d| render_line(d)).collect();
        assert_eq!(render(&domains), joined);
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&BTreeSet::new()), "");
    }
}
