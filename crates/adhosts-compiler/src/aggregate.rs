use adhosts_core::DomainSet;

/// Union the blocklist seed with every parsed filter list.
pub fn aggregate<I>(seed: DomainSet, lists: I) -> DomainSet
where
    I: IntoIterator<Item = DomainSet>,
{
    let mut candidates = seed;
    for list in lists {
        if candidates.is_empty() {
            candidates = list;
        } else {
            candidates.extend(list);
        }
    }
    candidates
}
