use serde::Serialize;
use serde::de::DeserializeOwned;
use strum::{AsRefStr, EnumIter};

use crate::storage::{Category, User};

/// 缓存实体类别，决定 key 命名空间与 TTL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum CacheKind {
    User,
    Category,
}

impl CacheKind {
    /// Key prefix for this kind. No prefix is a prefix of another.
    pub const fn prefix(self) -> &'static str {
        match self {
            CacheKind::User => "user_",
            CacheKind::Category => "category_",
        }
    }
}

impl std::fmt::Display for CacheKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// A backend key together with the kind that owns it.
///
/// Only constructible through the per-kind constructors, so callers never
/// assemble raw key strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: CacheKind,
    key: String,
}

impl CacheKey {
    pub fn user(user_id: i64) -> Self {
        Self {
            kind: CacheKind::User,
            key: format!("{}{}", CacheKind::User.prefix(), user_id),
        }
    }

    /// 分类列表是集合型缓存，只使用一个固定 key
    pub fn categories() -> Self {
        Self {
            kind: CacheKind::Category,
            key: CacheKind::Category.prefix().to_string(),
        }
    }

    pub fn kind(&self) -> CacheKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key)
    }
}

/// A record type with a fixed cache schema.
pub trait CacheEntity: Serialize + DeserializeOwned + Send + Sync {
    const KIND: CacheKind;
}

impl CacheEntity for User {
    const KIND: CacheKind = CacheKind::User;
}

impl CacheEntity for Vec<Category> {
    const KIND: CacheKind = CacheKind::Category;
}
