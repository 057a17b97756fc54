use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{error, info, trace};

use super::helpers::{ErrorCode, json_response};
use crate::context::AppContext;

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

impl AppStartTime {
    pub fn now() -> Self {
        Self {
            start_datetime: chrono::Utc::now(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct HealthStorageCheck {
    pub status: String,
    pub backend: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct HealthCacheCheck {
    pub backend: &'static str,
    pub user_hit_rate: f64,
    pub category_hit_rate: f64,
    pub user_hits: u64,
    pub user_misses: u64,
    pub category_hits: u64,
    pub category_misses: u64,
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: u64,
    pub storage: HealthStorageCheck,
    pub cache: HealthCacheCheck,
    pub response_time_ms: u64,
}

/// Health API
///
/// 直接读取 store 和计数器，不经过 ObjectCache 的读写路径，
/// 所以健康检查不会改变命中率。
pub struct HealthApi;

impl HealthApi {
    pub async fn health_check(
        ctx: web::Data<AppContext>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        let start_time = Instant::now();
        trace!("Received health check request");

        let backend = ctx.storage.backend_name();
        let storage = match tokio::time::timeout(
            Duration::from_secs(5),
            ctx.storage.list_categories(),
        )
        .await
        {
            Ok(Ok(_)) => HealthStorageCheck {
                status: "healthy".to_string(),
                backend,
                error: None,
            },
            Ok(Err(e)) => {
                error!("Storage health check failed: {}", e);
                HealthStorageCheck {
                    status: "unhealthy".to_string(),
                    backend,
                    error: Some(e.to_string()),
                }
            }
            Err(_) => {
                error!("Storage health check timeout");
                HealthStorageCheck {
                    status: "unhealthy".to_string(),
                    backend,
                    error: Some("timeout".to_string()),
                }
            }
        };

        let snapshot = ctx.counters().snapshot();
        let cache = HealthCacheCheck {
            backend: ctx.cache.backend_name(),
            user_hit_rate: snapshot.user_hit_rate(),
            category_hit_rate: snapshot.category_hit_rate(),
            user_hits: snapshot.user_hits,
            user_misses: snapshot.user_misses,
            category_hits: snapshot.category_hits,
            category_misses: snapshot.category_misses,
        };

        let now = chrono::Utc::now();
        let uptime = (now - app_start_time.start_datetime).num_seconds().max(0) as u64;
        let is_healthy = storage.status == "healthy";

        let health_data = HealthResponse {
            status: storage.status.clone(),
            timestamp: now.to_rfc3339(),
            uptime,
            storage,
            cache,
            response_time_ms: start_time.elapsed().as_millis() as u64,
        };

        info!(
            "Health check completed in {:?}, status: {}, uptime: {}s",
            start_time.elapsed(),
            health_data.status,
            uptime
        );

        if is_healthy {
            json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(health_data))
        } else {
            json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::InternalServerError,
                "Service Unavailable",
                Some(health_data),
            )
        }
    }

    // 活跃性检查
    pub async fn liveness_check() -> impl Responder {
        trace!("Received liveness check request");
        HttpResponse::NoContent().finish()
    }
}

/// Health 路由配置
pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(HealthApi::health_check))
        .route("", web::head().to(HealthApi::health_check))
        .route("/live", web::get().to(HealthApi::liveness_check))
}
