mod args;
mod mirror;
mod params;
mod resolved_command;

pub use args::{Args, Command, parse_args};
pub use mirror::run_mirror;
pub use params::{ChecksumSource, MirrorParams};
pub use resolved_command::{resolve_command, resolve_with_config};
