use clap::{ArgAction, Parser};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Raw command-line request, before it is merged with configuration.
#[derive(Debug, Clone, Default)]
pub struct Command {
    pub config_path: Option<String>,
    pub dry_run: bool,
    pub sleep_secs: Option<u64>,
    pub rate_limit_kbps: Option<u64>,
    pub packages_file: Option<String>,
    pub checksums_file: Option<String>,
    pub no_checksums: bool,
    pub base_url: Option<String>,
    pub output_dir: Option<String>,
    pub overwrite: bool,
    pub preserve_existing: bool,
    pub strict: bool,
    pub packages: Vec<String>,
}

pub struct Args {
    pub command: Command,
    pub log_level: Level,
}

#[derive(Debug, Parser)]
#[command(
    name = "slackmirror",
    version,
    about = "Mirror a Slackware package tree onto local storage with rate limiting and checksum verification"
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count
    )]
    verbose: u8,

    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Optional config file (YAML, TOML or JSON)"
    )]
    config: Option<String>,

    #[arg(long = "dry-run", help = "Report what would be downloaded without downloading")]
    dry_run: bool,

    #[arg(
        long = "sleep",
        value_name = "SECS",
        help = "Sleep time between downloads in seconds [config default: 3]"
    )]
    sleep: Option<u64>,

    #[arg(
        long = "rate-limit",
        value_name = "KBPS",
        help = "Download rate limit in kilobytes/sec, 0 to disable [config default: 500]"
    )]
    rate_limit: Option<u64>,

    #[arg(
        long = "packages-file",
        value_name = "FILE",
        help = "Path to a local PACKAGES.TXT file instead of fetching it from the mirror"
    )]
    packages_file: Option<String>,

    #[arg(
        long = "checksums-file",
        value_name = "FILE",
        help = "Path to a local CHECKSUMS.md5 file instead of fetching it from the mirror",
        conflicts_with = "no_checksums"
    )]
    checksums_file: Option<String>,

    #[arg(long = "no-checksums", help = "Do not load a checksum listing")]
    no_checksums: bool,

    #[arg(long = "base-url", value_name = "URL", help = "Overrides the mirror root URL")]
    base_url: Option<String>,

    #[arg(
        short = 'o',
        long = "output-dir",
        value_name = "DIR",
        help = "Overrides the local store directory"
    )]
    output_dir: Option<String>,

    #[arg(long = "overwrite", help = "Overwrite existing files")]
    overwrite: bool,

    #[arg(
        long = "preserve-existing",
        help = "Skip existing files that have no reference checksum"
    )]
    preserve_existing: bool,

    #[arg(
        long = "strict",
        help = "Exit with an error if any package failed or failed checksum verification"
    )]
    strict: bool,

    #[arg(value_name = "PACKAGE", help = "Package names to download (optional)")]
    packages: Vec<String>,
}

pub fn parse_args() -> Args {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    init_tracing(log_level);

    let command = Command {
        config_path: cli.config,
        dry_run: cli.dry_run,
        sleep_secs: cli.sleep,
        rate_limit_kbps: cli.rate_limit,
        packages_file: cli.packages_file,
        checksums_file: cli.checksums_file,
        no_checksums: cli.no_checksums,
        base_url: cli.base_url,
        output_dir: cli.output_dir,
        overwrite: cli.overwrite,
        preserve_existing: cli.preserve_existing,
        strict: cli.strict,
        packages: cli.packages,
    };

    Args { command, log_level }
}

fn init_tracing(log_level: Level) {
    let mut filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    for directive in ["hyper=warn", "hyper_util=warn", "reqwest=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
