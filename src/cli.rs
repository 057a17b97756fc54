//! Command-line interface definitions using clap

use clap::Parser;

/// Iscogram - photo-sharing web service core
#[derive(Parser, Debug)]
#[command(name = "iscogram")]
#[command(version)]
#[command(about = "Photo-sharing web service with object cache and request metrics", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file (missing file = defaults)
    #[arg(long, short = 'c', default_value = "config.toml")]
    pub config: String,

    /// Print a sample configuration file and exit
    #[arg(long)]
    pub print_config: bool,
}
