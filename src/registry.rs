//! 能力注册表模块
//!
//! 提供命名能力（ability）定义的注册与查找。
//!
//! 能力谓词是任意实现 `(Principal, Option<Resource>) -> Decision` 的可调用对象，
//! 在引擎启动阶段按名称注册一次，注册后不可变更也不可注销。
//! 重复注册同名能力会返回错误而不是覆盖。
//!
//! ## 示例
//!
//! ```rust
//! use authzrs::{AbilityRegistry, Decision, Principal, Resource};
//!
//! let registry = AbilityRegistry::new();
//!
//! // 注册基于属主关系的能力
//! registry
//!     .register("update-post", |principal: &Principal, resource: Option<&Resource>| {
//!         match resource {
//!             Some(r) if r.owned_by(principal.id()) => Decision::allow("principal owns resource"),
//!             _ => Decision::deny("principal does not own resource"),
//!         }
//!     })
//!     .unwrap();
//!
//! assert!(registry.contains("update-post"));
//!
//! // 重复注册失败且不改变已有谓词
//! let result = registry.register("update-post", |_: &Principal, _: Option<&Resource>| {
//!     Decision::allow("never used")
//! });
//! assert!(result.is_err());
//! ```

use crate::decision::Decision;
use crate::error::{Error, Result};
use crate::principal::{Principal, Resource};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// 能力谓词 trait
///
/// 任何实现 `(Principal, Option<Resource>) -> Decision` 的可调用对象
/// 都可以作为能力谓词注册。
///
/// ## 正确性要求
///
/// 谓词必须是其两个输入的纯函数：不得执行 I/O，不得修改外部状态。
/// 缓存未命中时同一谓词可能被并发调用多次，必须幂等且无副作用。
pub trait AbilityPredicate: Send + Sync {
    /// 针对主体和可选资源评估能力
    fn check(&self, principal: &Principal, resource: Option<&Resource>) -> Decision;
}

impl<F> AbilityPredicate for F
where
    F: Fn(&Principal, Option<&Resource>) -> Decision + Send + Sync,
{
    fn check(&self, principal: &Principal, resource: Option<&Resource>) -> Decision {
        self(principal, resource)
    }
}

/// 能力定义
///
/// 一个命名谓词，可以声明它引用的权限标识符用于内省和日志，
/// 但谓词本身可以包含任意逻辑（如属主关系比较）。
#[derive(Clone)]
pub struct AbilityDef {
    /// 能力名称
    name: String,
    /// 引用的权限标识符（仅用于内省）
    referenced_permissions: Vec<String>,
    /// 谓词
    predicate: Arc<dyn AbilityPredicate>,
}

impl AbilityDef {
    /// 创建新的能力定义
    pub fn new(name: impl Into<String>, predicate: impl AbilityPredicate + 'static) -> Self {
        Self {
            name: name.into(),
            referenced_permissions: Vec::new(),
            predicate: Arc::new(predicate),
        }
    }

    /// 声明引用的权限标识符
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.referenced_permissions.push(permission.into());
        self
    }

    /// 获取能力名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 获取引用的权限标识符
    pub fn referenced_permissions(&self) -> &[String] {
        &self.referenced_permissions
    }

    /// 调用谓词
    pub fn check(&self, principal: &Principal, resource: Option<&Resource>) -> Decision {
        self.predicate.check(principal, resource)
    }
}

impl fmt::Debug for AbilityDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbilityDef")
            .field("name", &self.name)
            .field("referenced_permissions", &self.referenced_permissions)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// AbilityRegistry
// ============================================================================

/// 能力注册表
///
/// 按名称存储能力定义。名称全局唯一，查找按精确匹配进行，
/// 不支持通配符。注册表设计为启动阶段写入、运行期只读，
/// 但内部使用读写锁，晚注册也不会让并发查找观察到部分注册的谓词。
#[derive(Debug, Default)]
pub struct AbilityRegistry {
    abilities: RwLock<HashMap<String, Arc<AbilityDef>>>,
}

impl AbilityRegistry {
    /// 创建新的能力注册表
    pub fn new() -> Self {
        Self {
            abilities: RwLock::new(HashMap::new()),
        }
    }

    /// 注册能力谓词
    ///
    /// 同名能力已存在时返回 [`Error::DuplicateAbility`]，
    /// 且不改变已注册谓词的行为。
    pub fn register(
        &self,
        name: impl Into<String>,
        predicate: impl AbilityPredicate + 'static,
    ) -> Result<()> {
        let name = name.into();
        let def = AbilityDef::new(name.clone(), predicate);
        self.register_def(def)
    }

    /// 注册完整的能力定义
    pub fn register_def(&self, def: AbilityDef) -> Result<()> {
        let mut abilities = self.abilities.write().unwrap();
        if abilities.contains_key(def.name()) {
            return Err(Error::duplicate_ability(def.name()));
        }
        abilities.insert(def.name().to_string(), Arc::new(def));
        Ok(())
    }

    /// 按名称查找能力定义
    pub fn lookup(&self, name: &str) -> Option<Arc<AbilityDef>> {
        self.abilities.read().unwrap().get(name).cloned()
    }

    /// 检查能力是否已注册
    pub fn contains(&self, name: &str) -> bool {
        self.abilities.read().unwrap().contains_key(name)
    }

    /// 获取已注册的能力数量
    pub fn len(&self) -> usize {
        self.abilities.read().unwrap().len()
    }

    /// 检查注册表是否为空
    pub fn is_empty(&self) -> bool {
        self.abilities.read().unwrap().is_empty()
    }

    /// 列出所有已注册的能力名称
    pub fn ability_names(&self) -> Vec<String> {
        self.abilities.read().unwrap().keys().cloned().collect()
    }
}
