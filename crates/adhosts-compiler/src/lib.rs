//! unbound-adhosts Feed Compiler
//!
//! Turns raw feed bodies and local seed files into the final, filtered
//! domain set.

pub mod aggregate;
pub mod filter;
pub mod parser;
pub mod seed;

pub use aggregate::aggregate;
pub use filter::{apply_exclusions, FilterStats};
pub use parser::parse_filter_list;
pub use seed::{load_seed, parse_seed, SeedError};
