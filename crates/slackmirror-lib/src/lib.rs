pub mod checksum;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod local;
pub mod manifest;
pub mod plan;
pub mod report;
pub mod source;
pub mod verification;

pub use config::Config;
pub use error::MirrorError;
