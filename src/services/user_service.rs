//! User read-through / write-through paths.
//!
//! Every path treats the cache as an optimisation only: cache errors are
//! logged and the store answers instead.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::ObjectCache;
use crate::errors::{IscogramError, Result};
use crate::storage::{Store, User};

pub struct UserService {
    storage: Arc<dyn Store>,
    cache: Arc<ObjectCache>,
}

impl UserService {
    pub fn new(storage: Arc<dyn Store>, cache: Arc<ObjectCache>) -> Self {
        Self { storage, cache }
    }

    /// Resolve the session user. Unknown ids yield [`User::empty`].
    pub async fn session_user(&self, user_id: i64) -> Result<User> {
        if user_id == 0 {
            return Ok(User::empty());
        }

        match self.cache.get_user_from_cache(user_id).await {
            Ok(Some(user)) => return Ok(user),
            Ok(None) => {}
            Err(e) => warn!("Failed to get user {} from cache: {}", user_id, e),
        }

        let Some(user) = self.storage.get_user(user_id).await? else {
            debug!("User {} not found in store", user_id);
            return Ok(User::empty());
        };

        self.refresh(&user, "lookup").await;
        Ok(user)
    }

    /// 注册新用户并写入缓存
    pub async fn register(&self, account_name: &str) -> Result<User> {
        let user = self.storage.insert_user(account_name).await?;
        self.refresh(&user, "register").await;
        Ok(user)
    }

    /// 登录：读取存储中的最新记录并刷新缓存
    pub async fn login(&self, account_name: &str) -> Result<User> {
        let user = self
            .storage
            .find_user_by_account(account_name)
            .await?
            .filter(|u| !u.is_banned())
            .ok_or_else(|| {
                IscogramError::not_found(format!("unknown account '{}'", account_name))
            })?;
        self.refresh(&user, "login").await;
        Ok(user)
    }

    /// 登出：使缓存失效
    pub async fn logout(&self, user_id: i64) {
        if let Err(e) = self.cache.delete_user_cache(user_id).await {
            warn!("Failed to delete user cache on logout: {}", e);
        }
    }

    /// 可被封禁的会员列表，直接读存储
    pub async fn active_members(&self) -> Result<Vec<User>> {
        self.storage.list_active_members().await
    }

    /// 封禁用户并刷新每个用户的缓存，避免缓存里残留旧的 del_flg
    pub async fn ban(&self, ids: &[i64]) -> Result<Vec<User>> {
        let banned = self.storage.ban_users(ids).await?;
        for user in &banned {
            self.refresh(user, "ban").await;
        }
        Ok(banned)
    }

    async fn refresh(&self, user: &User, reason: &str) {
        if let Err(e) = self.cache.set_user_cache(user).await {
            warn!("Failed to set user cache on {}: {}", reason, e);
        }
    }
}
