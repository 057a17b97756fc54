//! Relational store boundary.
//!
//! The object cache fronts this store: callers read through the cache and
//! fall back here on a miss or on any cache error. Only the in-memory
//! implementation lives in this crate.

use async_trait::async_trait;

use crate::errors::Result;

pub mod memory;
pub mod models;

pub use memory::MemoryStore;
pub use models::{Category, User};

#[async_trait]
pub trait Store: Send + Sync {
    async fn get_user(&self, id: i64) -> Result<Option<User>>;

    async fn find_user_by_account(&self, account_name: &str) -> Result<Option<User>>;

    /// 新建用户，账号名重复时返回 Validation 类错误
    async fn insert_user(&self, account_name: &str) -> Result<User>;

    /// 普通会员（非管理员、未封禁），最新注册的在前
    async fn list_active_members(&self) -> Result<Vec<User>>;

    /// 将 `ids` 标记为封禁，返回实际更新后的记录；不存在的 id 被忽略
    async fn ban_users(&self, ids: &[i64]) -> Result<Vec<User>>;

    async fn list_categories(&self) -> Result<Vec<Category>>;

    async fn insert_category(&self, name: &str) -> Result<Category>;

    /// 管理员初始化：删除种子数据之后新增的记录
    async fn reset(&self) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}
