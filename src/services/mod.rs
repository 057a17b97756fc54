//! Business logic shared by the HTTP handlers.

pub mod admin_service;
pub mod category_service;
pub mod user_service;

pub use admin_service::AdminService;
pub use category_service::CategoryService;
pub use user_service::UserService;
