use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use super::helpers::{ErrorCode, api_result, error_response, success_response};
use crate::context::AppContext;
use crate::storage::User;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AccountRequest {
    pub account_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UserResponse {
    pub id: i64,
    pub account_name: String,
    pub authority: i32,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            account_name: user.account_name,
            authority: user.authority,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

pub struct UserApi;

impl UserApi {
    /// GET /users/{id}
    pub async fn get_user(
        path: web::Path<i64>,
        ctx: web::Data<AppContext>,
    ) -> impl Responder {
        let user_id = path.into_inner();
        trace!("Fetching session user {}", user_id);

        match ctx.users.session_user(user_id).await {
            Ok(user) if user.is_empty() => error_response(
                StatusCode::NOT_FOUND,
                ErrorCode::NotFound,
                &format!("User {} not found", user_id),
            ),
            result => api_result(result.map(UserResponse::from)),
        }
    }

    /// POST /register
    pub async fn register(
        body: web::Json<AccountRequest>,
        ctx: web::Data<AppContext>,
    ) -> impl Responder {
        let result = ctx.users.register(&body.account_name).await;
        if let Ok(user) = &result {
            info!("Registered user {} ({})", user.id, user.account_name);
        }
        api_result(result.map(UserResponse::from))
    }

    /// POST /login
    pub async fn login(
        body: web::Json<AccountRequest>,
        ctx: web::Data<AppContext>,
    ) -> impl Responder {
        api_result(ctx.users.login(&body.account_name).await.map(UserResponse::from))
    }

    /// POST /logout/{id}
    pub async fn logout(path: web::Path<i64>, ctx: web::Data<AppContext>) -> HttpResponse {
        ctx.users.logout(path.into_inner()).await;
        success_response(serde_json::json!({ "logged_out": true }))
    }
}
