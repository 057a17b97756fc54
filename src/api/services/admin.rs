use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::helpers::{ErrorCode, api_result, error_from_iscogram, error_response};
use super::users::UserResponse;
use crate::context::AppContext;
use crate::storage::User;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AdminQuery {
    pub admin_id: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BanRequest {
    pub admin_id: i64,
    #[serde(default)]
    pub user_ids: Vec<i64>,
}

pub struct AdminApi;

impl AdminApi {
    /// GET /initialize
    ///
    /// Restores the seed data and flushes the whole cache.
    pub async fn initialize(ctx: web::Data<AppContext>) -> impl Responder {
        match ctx.admin.initialize().await {
            Ok(()) => {
                info!("Application state initialized");
                api_result(Ok(serde_json::json!({ "initialized": true })))
            }
            Err(e) => {
                error!("Initialize failed: {}", e);
                error_from_iscogram(&e)
            }
        }
    }

    /// GET /admin/banned?admin_id=
    pub async fn banned_list(
        query: web::Query<AdminQuery>,
        ctx: web::Data<AppContext>,
    ) -> HttpResponse {
        if let Err(resp) = Self::require_admin(&ctx, query.admin_id).await {
            return resp;
        }
        let members = ctx.users.active_members().await;
        api_result(members.map(|users| {
            users
                .into_iter()
                .map(UserResponse::from)
                .collect::<Vec<_>>()
        }))
    }

    /// POST /admin/banned
    pub async fn ban(body: web::Json<BanRequest>, ctx: web::Data<AppContext>) -> HttpResponse {
        let admin = match Self::require_admin(&ctx, body.admin_id).await {
            Ok(admin) => admin,
            Err(resp) => return resp,
        };

        match ctx.users.ban(&body.user_ids).await {
            Ok(banned) => {
                info!("Admin {} banned {} users", admin.id, banned.len());
                let ids: Vec<i64> = banned.iter().map(|u| u.id).collect();
                api_result(Ok(serde_json::json!({ "banned": ids })))
            }
            Err(e) => {
                error!("Ban failed: {}", e);
                error_from_iscogram(&e)
            }
        }
    }

    async fn require_admin(ctx: &AppContext, admin_id: i64) -> Result<User, HttpResponse> {
        let me = ctx
            .users
            .session_user(admin_id)
            .await
            .map_err(|e| error_from_iscogram(&e))?;
        if me.is_empty() {
            return Err(error_response(
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
                "Login required",
            ));
        }
        if !me.is_admin() {
            warn!("User {} attempted an admin operation", me.id);
            return Err(error_response(
                StatusCode::FORBIDDEN,
                ErrorCode::Forbidden,
                "Admin authority required",
            ));
        }
        Ok(me)
    }
}
