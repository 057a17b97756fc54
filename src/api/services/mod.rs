//! HTTP handlers
//!
//! Thin actix-web layer over the domain services in [`crate::services`].
//! Handlers never see cache errors: the services fall back to the store.

pub mod admin;
pub mod categories;
pub mod health;
pub mod helpers;
pub mod users;

use actix_web::web;

pub use admin::AdminApi;
pub use categories::CategoryApi;
pub use health::{AppStartTime, HealthApi, health_routes};
pub use users::UserApi;

/// Application routes (without middleware or app data).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/initialize", web::get().to(AdminApi::initialize))
        .route("/users/{id}", web::get().to(UserApi::get_user))
        .route("/register", web::post().to(UserApi::register))
        .route("/login", web::post().to(UserApi::login))
        .route("/logout/{id}", web::post().to(UserApi::logout))
        .route("/categories", web::get().to(CategoryApi::list))
        .route("/categories", web::post().to(CategoryApi::create))
        .route("/admin/banned", web::get().to(AdminApi::banned_list))
        .route("/admin/banned", web::post().to(AdminApi::ban))
        .service(health_routes());
}
