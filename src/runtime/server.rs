//! Server mode
//!
//! Builds the shared state, starts the HTTP server and coordinates the
//! graceful shutdown of the server and the metric tasks.

use actix_web::{App, HttpServer, middleware::DefaultHeaders, web};
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::api::configure_routes;
use crate::api::middleware::TimingMiddleware;
use crate::api::services::AppStartTime;
use crate::config::StaticConfig;
use crate::runtime::lifetime;

/// Run the HTTP server until Ctrl+C
///
/// 1. Prepares the cache, store, counters and metric tasks
/// 2. Starts the HTTP server with the timing middleware outermost
/// 3. On a shutdown signal stops the server first, then the metric tasks
///
/// **Note**: Logging must be initialized before calling this function
pub async fn run_server(config: &StaticConfig) -> Result<()> {
    let app_start_time = AppStartTime::now();

    let startup = lifetime::startup::prepare_server_startup(config)
        .await
        .inspect_err(|e| tracing::error!("Server startup failed: {}", e))?;

    let context = web::Data::from(startup.context.clone());
    let timing = startup.timing.clone();
    let grace = config.metrics.shutdown_grace();

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(
                DefaultHeaders::new()
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            // 最后 wrap 的在最外层，记录完整请求延迟
            .wrap(TimingMiddleware::new(timing.clone()))
            .app_data(context.clone())
            .app_data(web::Data::new(app_start_time.clone()))
            .app_data(web::PayloadConfig::new(1024 * 1024))
            .configure(configure_routes)
    })
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_millis(5000))
    .disable_signals()
    .shutdown_timeout(grace.as_secs().max(1))
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    warn!("Starting server at http://{}", bind_address);
    let handle = server.handle();
    tokio::pin!(server);

    let signaled = tokio::select! {
        res = &mut server => {
            res.context("HTTP server exited with an error")?;
            false
        }
        _ = lifetime::shutdown::wait_for_signal() => true,
    };

    if signaled {
        // stop() 需要 server future 继续被 poll 才能完成
        let ((), res) = tokio::join!(handle.stop(true), &mut server);
        res.context("HTTP server failed while stopping")?;
        info!("HTTP server stopped");
    }

    // 所有 TimingSender 随 App 一起释放后再关闭指标任务
    drop(startup.timing);
    lifetime::shutdown::stop_background_tasks(startup.tasks, grace).await;
    info!("Graceful shutdown completed");
    Ok(())
}
