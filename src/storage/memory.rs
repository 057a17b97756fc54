use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{debug, trace};

use super::{Category, Store, User};
use crate::errors::{IscogramError, Result};

/// 内存存储实现，用于演示模式和测试
///
/// 种子数据在 `reset()` 时保留，之后新增的记录会被删除。
pub struct MemoryStore {
    users: Arc<DashMap<i64, User>>,
    /// 账号名 → id，注册时用于原子地占用账号名
    accounts: DashMap<String, i64>,
    categories: Arc<DashMap<i64, Category>>,
    seed_users: Vec<User>,
    seed_categories: Vec<Category>,
    next_user_id: AtomicI64,
    next_category_id: AtomicI64,
}

impl MemoryStore {
    pub fn new(seed_users: Vec<User>, seed_categories: Vec<Category>) -> Self {
        let store = Self {
            users: Arc::new(DashMap::new()),
            accounts: DashMap::new(),
            categories: Arc::new(DashMap::new()),
            next_user_id: AtomicI64::new(0),
            next_category_id: AtomicI64::new(0),
            seed_users,
            seed_categories,
        };
        store.load_seed();
        store
    }

    /// Demo data: one admin, a handful of members, every 50th member banned.
    pub fn with_demo_data() -> Self {
        let mut users = Vec::new();
        for id in 1..=100 {
            let mut user = User::new(id, format!("user{:03}", id));
            if id == 1 {
                user.authority = 1;
            }
            if id % 50 == 0 {
                user.del_flg = 1;
            }
            users.push(user);
        }
        let categories = ["landscape", "portrait", "food", "animals", "street"]
            .iter()
            .enumerate()
            .map(|(i, name)| Category::new(i as i64 + 1, *name))
            .collect();
        Self::new(users, categories)
    }

    fn load_seed(&self) {
        self.users.clear();
        self.accounts.clear();
        self.categories.clear();

        let mut max_user = 0;
        for user in &self.seed_users {
            max_user = max_user.max(user.id);
            self.accounts.insert(user.account_name.clone(), user.id);
            self.users.insert(user.id, user.clone());
        }
        let mut max_category = 0;
        for category in &self.seed_categories {
            max_category = max_category.max(category.id);
            self.categories.insert(category.id, category.clone());
        }

        self.next_user_id.store(max_user + 1, Ordering::SeqCst);
        self.next_category_id.store(max_category + 1, Ordering::SeqCst);
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        trace!("MemoryStore.get_user: {}", id);
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_user_by_account(&self, account_name: &str) -> Result<Option<User>> {
        let Some(id) = self.accounts.get(account_name).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn insert_user(&self, account_name: &str) -> Result<User> {
        if account_name.is_empty() {
            return Err(IscogramError::validation("account name must not be empty"));
        }

        // entry() 持有分片锁，检查与占用是一步完成的
        let user = match self.accounts.entry(account_name.to_string()) {
            Entry::Occupied(_) => {
                return Err(IscogramError::validation(format!(
                    "account name '{}' is already taken",
                    account_name
                )));
            }
            Entry::Vacant(slot) => {
                let id = self.next_user_id.fetch_add(1, Ordering::SeqCst);
                let user = User::new(id, account_name);
                self.users.insert(id, user.clone());
                slot.insert(id);
                user
            }
        };
        debug!("MemoryStore: inserted user {} ({})", user.id, account_name);
        Ok(user)
    }

    async fn list_active_members(&self) -> Result<Vec<User>> {
        let mut members: Vec<User> = self
            .users
            .iter()
            .filter(|u| !u.is_admin() && !u.is_banned())
            .map(|u| u.value().clone())
            .collect();
        members.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(members)
    }

    async fn ban_users(&self, ids: &[i64]) -> Result<Vec<User>> {
        let mut banned = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(mut user) = self.users.get_mut(id) {
                user.del_flg = 1;
                banned.push(user.clone());
            }
        }
        debug!("MemoryStore: banned {} of {} users", banned.len(), ids.len());
        Ok(banned)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories: Vec<Category> =
            self.categories.iter().map(|c| c.value().clone()).collect();
        categories.sort_by_key(|c| c.id);
        Ok(categories)
    }

    async fn insert_category(&self, name: &str) -> Result<Category> {
        if name.is_empty() {
            return Err(IscogramError::validation("category name must not be empty"));
        }
        let id = self.next_category_id.fetch_add(1, Ordering::SeqCst);
        let category = Category::new(id, name);
        self.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn reset(&self) -> Result<()> {
        self.load_seed();
        debug!(
            "MemoryStore reset: {} users, {} categories",
            self.users.len(),
            self.categories.len()
        );
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
