use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 用户记录（缓存与存储共用的结构）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub account_name: String,
    #[serde(default)]
    pub authority: i32,
    #[serde(default)]
    pub del_flg: i32,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: i64, account_name: impl Into<String>) -> Self {
        Self {
            id,
            account_name: account_name.into(),
            authority: 0,
            del_flg: 0,
            created_at: Utc::now(),
        }
    }

    /// The anonymous projection returned when no session user exists.
    pub fn empty() -> Self {
        Self {
            id: 0,
            account_name: String::new(),
            authority: 0,
            del_flg: 0,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id == 0
    }

    pub fn is_admin(&self) -> bool {
        self.authority != 0
    }

    pub fn is_banned(&self) -> bool {
        self.del_flg != 0
    }
}

impl Default for User {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

impl Category {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
