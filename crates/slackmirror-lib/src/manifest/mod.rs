mod parser;
mod types;

pub use parser::parse_manifest;
pub use types::{PackageRecord, normalize_location};
