use adhosts_core::document::ZONE_PREFIX;
use adhosts_core::domain::canonical_entry;
use adhosts_core::{DomainSet, SourceFormat};

/// Only rewrite target accepted on ad-filter lines. Any other
/// `$dnsrewrite` answer means "rewrite", not "block".
pub const BLOCKING_REWRITE: &str = "dnsrewrite=ad-block.dns.adguard.com";

/// Address prefixes that mark a hosts-file line as a block entry.
pub const HOSTFILE_ADDRESS_PREFIXES: &[&str] = &["127", "0.", "::"];

/// Parse one feed body into a set of canonical domains.
///
/// Lines that do not match the grammar are skipped without error.
pub fn parse_filter_list(format: SourceFormat, text: &str) -> DomainSet {
    let parse_line = line_parser(format);
    let mut domains = DomainSet::new();

    for raw_line in text.lines() {
        if let Some(domain) = parse_line(raw_line).and_then(canonical_entry) {
            domains.insert(domain.to_string());
        }
    }

    domains
}

/// Line parser for `format`. Returned domains are not yet canonicalized.
pub fn line_parser(format: SourceFormat) -> fn(&str) -> Option<&str> {
    match format {
        SourceFormat::AdFilter => parse_ad_filter_line,
        SourceFormat::BareDomain => parse_bare_domain_line,
        SourceFormat::Hostfile => parse_hostfile_line,
        SourceFormat::ResolverZone => parse_resolver_zone_line,
    }
}

/// `||domain^`, `||.domain^`, `.domain^` or `domain^`, optionally followed by
/// the blocking rewrite modifier.
pub fn parse_ad_filter_line(line: &str) -> Option<&str> {
    let line = line.trim();
    let rest = line.strip_prefix("||").unwrap_or(line);
    let rest = rest.strip_prefix('.').unwrap_or(rest);

    let body = match rest.split_once('$') {
        Some((body, modifier)) => {
            if modifier != BLOCKING_REWRITE {
                return None;
            }
            body
        }
        None => rest,
    };

    let host = body.strip_suffix('^')?;
    if host.is_empty() || !host.chars().all(is_host_char) {
        return None;
    }

    Some(host)
}

/// One domain per line. Blank lines and `#` comments are skipped.
pub fn parse_bare_domain_line(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(line)
}

/// `<address> <domain> ...` where the address starts with `127`, `0.` or `::`.
pub fn parse_hostfile_line(line: &str) -> Option<&str> {
    let mut tokens = line.split_whitespace();
    let address = tokens.next()?;

    let blocking = HOSTFILE_ADDRESS_PREFIXES
        .iter()
        .any(|prefix| address.len() > prefix.len() && address.starts_with(prefix));
    if !blocking {
        return None;
    }

    tokens.next()
}

/// `local-zone: "<domain>" <action>`.
pub fn parse_resolver_zone_line(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix(ZONE_PREFIX)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let rest = rest.trim_start().strip_prefix('"')?;
    let (name, after) = rest.split_once('"')?;
    if name.is_empty() || !after.starts_with(char::is_whitespace) {
        return None;
    }

    Some(name)
}

fn is_host_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '-' || ch == '.'
}
