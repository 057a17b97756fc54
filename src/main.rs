use clap::Parser;
use tracing::info;

use iscogram::cli::Cli;
use iscogram::config::StaticConfig;
use iscogram::runtime::run_server;
use iscogram::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", StaticConfig::generate_sample_config());
        return Ok(());
    }

    dotenvy::dotenv().ok();

    let config = StaticConfig::load(&cli.config);
    // guard 必须存活到进程结束，否则缓冲中的日志会丢失
    let _log_guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };

    info!(
        "Starting iscogram v{} (cache backend: {})",
        env!("CARGO_PKG_VERSION"),
        config.cache.backend
    );

    run_server(&config).await
}
