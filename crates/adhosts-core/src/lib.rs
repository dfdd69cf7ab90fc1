//! unbound-adhosts Core Library
//!
//! Domain model and the pure decision logic behind the blocklist build:
//! canonical domain handling, the exclusion filter, the output document
//! format and the content digest used for change detection.
//!
//! # Modules
//!
//! - `domain`: trailing-dot canonicalization and label helpers
//! - `source`: feed descriptors, format tags and the built-in feed list
//! - `exclude`: malformed-entry pre-filter and reversed-label allowlist
//! - `document`: rendering the sorted domain set as resolver directives
//! - `digest`: SHA-512 content digests

pub mod digest;
pub mod document;
pub mod domain;
pub mod exclude;
pub mod source;

// Re-export commonly used types
pub use digest::{digest_bytes, digest_file, ContentDigest};
pub use document::{render, render_line};
pub use domain::canonicalize;
pub use exclude::{Allowlist, ExclusionFilter, MalformedRule, PreFilter, Verdict};
pub use source::{default_sources, DomainSet, Source, SourceFormat};
