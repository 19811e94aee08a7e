//! 决策缓存模块
//!
//! 按 `(主体, 能力, 资源指纹)` 记忆化决策结果。钩子和谓词对于
//! 给定的图快照是确定性的，因此在两次失效事件之间返回缓存决策
//! 是可靠的优化。
//!
//! 失效是粗粒度的（正确性优先于粒度）：
//!
//! - 主体的角色集合变化时，整体清除该主体的所有条目
//! - 角色的权限集合变化时，清除所有持有该角色的主体的条目
//!   （通过条目记录的插入时角色集合反向定位）
//!
//! 默认不启用 TTL，失效完全由事件驱动；可通过配置开启 TTL 兜底。

use crate::decision::Decision;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// 缓存键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// 主体标识符
    pub principal_id: String,
    /// 能力名称
    pub ability: String,
    /// 资源指纹
    pub resource_fingerprint: String,
}

impl CacheKey {
    /// 创建新的缓存键
    pub fn new(
        principal_id: impl Into<String>,
        ability: impl Into<String>,
        resource_fingerprint: impl Into<String>,
    ) -> Self {
        Self {
            principal_id: principal_id.into(),
            ability: ability.into(),
            resource_fingerprint: resource_fingerprint.into(),
        }
    }
}

/// 缓存条目
///
/// 除决策外记录创建时间（用于 TTL）和插入时主体持有的角色集合
/// （用于按角色的反向失效）
#[derive(Debug, Clone)]
struct CacheEntry {
    decision: Decision,
    created_at: DateTime<Utc>,
    principal_roles: HashSet<String>,
}

/// 缓存统计信息
///
/// 命中/未命中计数器对外可见，调用方可以据此验证
/// 第二次相同检查确实由缓存提供
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// 命中次数
    pub hits: u64,
    /// 未命中次数
    pub misses: u64,
    /// 插入次数
    pub insertions: u64,
    /// 失效清除的条目数
    pub invalidations: u64,
}

/// 决策缓存
///
/// 支持并发读写的决策记忆化存储
#[derive(Debug, Default)]
pub struct DecisionCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    invalidations: AtomicU64,
}

impl DecisionCache {
    /// 创建无 TTL 的缓存（失效完全由事件驱动）
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带 TTL 兜底的缓存
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::default()
        }
    }

    /// 查找缓存的决策
    ///
    /// 过期条目视为未命中并被清除
    pub fn get(&self, key: &CacheKey) -> Option<Decision> {
        let expired = {
            let entries = self.entries.read().unwrap();
            match entries.get(key) {
                Some(entry) => {
                    if self.is_expired(entry) {
                        true
                    } else {
                        self.hits.fetch_add(1, Ordering::Relaxed);
                        return Some(entry.decision.clone());
                    }
                }
                None => false,
            }
        };

        if expired {
            self.entries.write().unwrap().remove(key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// 插入决策
    ///
    /// `principal_roles` 是主体在决策时刻持有的角色集合，
    /// 供按角色的反向失效使用
    pub fn insert(&self, key: CacheKey, decision: Decision, principal_roles: HashSet<String>) {
        let entry = CacheEntry {
            decision,
            created_at: Utc::now(),
            principal_roles,
        };
        self.entries.write().unwrap().insert(key, entry);
        self.insertions.fetch_add(1, Ordering::Relaxed);
    }

    /// 清除主体的所有条目
    pub fn invalidate_principal(&self, principal_id: &str) {
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|key, _| key.principal_id != principal_id);
        let removed = (before - entries.len()) as u64;
        self.invalidations.fetch_add(removed, Ordering::Relaxed);
    }

    /// 清除所有持有指定角色的主体的条目
    pub fn invalidate_role(&self, role_id: &str) {
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| !entry.principal_roles.contains(role_id));
        let removed = (before - entries.len()) as u64;
        self.invalidations.fetch_add(removed, Ordering::Relaxed);
    }

    /// 整体清空缓存
    pub fn flush(&self) {
        let mut entries = self.entries.write().unwrap();
        let removed = entries.len() as u64;
        entries.clear();
        self.invalidations.fetch_add(removed, Ordering::Relaxed);
    }

    /// 获取条目数量
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// 检查缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }

    /// 获取统计信息快照
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        match self.ttl {
            Some(ttl) => {
                let age = Utc::now().signed_duration_since(entry.created_at);
                age.to_std().map(|age| age >= ttl).unwrap_or(false)
            }
            None => false,
        }
    }
}
