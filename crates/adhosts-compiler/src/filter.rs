use std::collections::BTreeSet;

use adhosts_core::{DomainSet, ExclusionFilter, Verdict};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub before: usize,
    pub after: usize,
    pub malformed: usize,
    pub allowlisted: usize,
}

/// Drop every candidate the filter rejects and return the rest sorted.
pub fn apply_exclusions(
    candidates: DomainSet,
    filter: &ExclusionFilter,
) -> (BTreeSet<String>, FilterStats) {
    let mut stats = FilterStats {
        before: candidates.len(),
        ..FilterStats::default()
    };

    let mut kept = BTreeSet::new();
    for domain in candidates {
        match filter.verdict(&domain) {
            Verdict::Keep => {
                kept.insert(domain);
            }
            Verdict::Malformed => stats.malformed += 1,
            Verdict::Allowlisted => stats.allowlisted += 1,
        }
    }

    stats.after = kept.len();
    (kept, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adhosts_core::render;

    fn set(items: &[&str]) -> DomainSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_apply_exclusions() {
        let filter = ExclusionFilter::with_allowlist(["example.com"]);
        let candidates = set(&[
            "ads.example.com",
            "example.com",
            "evilexample.com",
            "example.com.attacker.net",
            "junk.test\"",
            "tracker.test",
        ]);

        let (kept, stats) = apply_exclusions(candidates, &filter);
        let kept: Vec<&str> = kept.iter().map(String::as_str).collect();
        assert_eq!(kept, ["evilexample.com", "example.com.attacker.net", "tracker.test"]);
        assert_eq!(
            stats,
            FilterStats {
                before: 6,
                after: 3,
                malformed: 1,
                allowlisted: 2,
            }
        );
    }

    #[test]
    fn test_rendered_document_independent_of_candidate_order() {
        let filter = ExclusionFilter::with_allowlist(["allowed.test"]);
        let domains = [
            "zeta.test",
            "Alpha.test",
            "cdn.allowed.test",
            "alpha.test",
            "mid.example",
            "junk\"",
            "b.example",
        ];

        let mut documents = Vec::new();
        for rotation in 0..domains.len() {
            let mut permuted = domains.to_vec();
            permuted.rotate_left(rotation);
            if rotation % 2 == 1 {
                permuted.reverse();
            }

            let mut candidates = DomainSet::with_capacity(rotation * 7 + 1);
            for domain in permuted {
                candidates.insert(domain.to_string());
            }
            let (kept, _) = apply_exclusions(candidates, &filter);
            documents.push(render(&kept));
        }

        assert!(documents.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(
            documents[0],
            "local-zone: \"Alpha.test.\" always_nxdomain\n\
             local-zone: \"alpha.test.\" always_nxdomain\n\
             local-zone: \"b.example.\" always_nxdomain\n\
             local-zone: \"mid.example.\" always_nxdomain\n\
             local-zone: \"zeta.test.\" always_nxdomain\n"
        );
    }

    #[test]
    fn test_result_is_subset() {
        let filter = ExclusionFilter::with_allowlist(["b.test"]);
        let candidates = set(&["a.test", "x.b.test", "c.test"]);
        let (kept, _) = apply_exclusions(candidates.clone(), &filter);
        assert!(kept.iter().all(|d| candidates.contains(d)));
    }
}
