//! 决策引擎模块
//!
//! 提供授权检查的单一入口 [`Gate::check`]，按固定顺序组合
//! 前置钩子、规则评估、后置钩子、审计和缓存：
//!
//! 1. **缓存查找** — 存在未失效的条目时直接返回，不重跑钩子
//! 2. **前置钩子** — 按注册顺序执行，第一个返回决策的钩子
//!    短路其余前置钩子和规则评估器（"超级管理员放行"模式，
//!    也可用于一刀切拒绝）
//! 3. **规则评估** — 注册表谓词优先，图成员关系兜底
//! 4. **后置钩子** — 按注册顺序执行，每个钩子看到当前决策，
//!    返回的决策会覆盖它；最后一个返回决策的钩子说了算
//! 5. **审计与缓存** — 最终决策送入审计汇并写入缓存
//!
//! 钩子的顺序语义（前置首个非空获胜、后置最后获胜）是本库的
//! 明确设计选择。
//!
//! ## 使用示例
//!
//! ```rust
//! use authzrs::{Decision, Gate, InMemoryGraphSource, Principal, Resource, Role};
//!
//! let source = InMemoryGraphSource::new();
//! source.add_role(Role::new("editor").with_permission("edit-post"));
//! source.assign_role("alice", "editor");
//!
//! let gate = Gate::builder(source.clone())
//!     .ability("update-post", |principal: &Principal, resource: Option<&Resource>| {
//!         match resource {
//!             Some(r) if r.owned_by(principal.id()) => Decision::allow("owner"),
//!             _ => Decision::deny("not owner"),
//!         }
//!     })
//!     .build()
//!     .unwrap();
//!
//! gate.invalidate_principal("alice").unwrap();
//!
//! let alice = Principal::new("alice").with_role("editor");
//! assert!(gate.allows(&alice, "edit-post", None));
//! assert!(!gate.allows(&alice, "delete-post", None));
//! ```

use crate::audit::{AuditSink, DecisionRecord, NoOpAuditSink};
use crate::cache::{CacheKey, CacheStats, DecisionCache};
use crate::decision::{Decision, DecisionSource};
use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use crate::graph::{GraphSource, RolePermissionGraph};
use crate::principal::{resource_fingerprint, Principal, Resource};
use crate::registry::{AbilityDef, AbilityPredicate, AbilityRegistry};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// 前置钩子 trait
///
/// 在规则评估之前运行。返回 `Some(decision)` 会短路其余前置钩子
/// 和规则评估器；返回 `None` 表示无意见，流程继续。
pub trait BeforeHook: Send + Sync {
    /// 检查前置钩子意见
    fn before(
        &self,
        principal: &Principal,
        ability: &str,
        resource: Option<&Resource>,
    ) -> Option<Decision>;
}

impl<F> BeforeHook for F
where
    F: Fn(&Principal, &str, Option<&Resource>) -> Option<Decision> + Send + Sync,
{
    fn before(
        &self,
        principal: &Principal,
        ability: &str,
        resource: Option<&Resource>,
    ) -> Option<Decision> {
        self(principal, ability, resource)
    }
}

/// 后置钩子 trait
///
/// 在规则评估之后运行，可以检视当前决策并选择覆盖它。
/// 返回 `None` 时当前决策不变。
pub trait AfterHook: Send + Sync {
    /// 检视（并可能覆盖）当前决策
    fn after(
        &self,
        principal: &Principal,
        ability: &str,
        resource: Option<&Resource>,
        decision: &Decision,
    ) -> Option<Decision>;
}

impl<F> AfterHook for F
where
    F: Fn(&Principal, &str, Option<&Resource>, &Decision) -> Option<Decision> + Send + Sync,
{
    fn after(
        &self,
        principal: &Principal,
        ability: &str,
        resource: Option<&Resource>,
        decision: &Decision,
    ) -> Option<Decision> {
        self(principal, ability, resource, decision)
    }
}

// ============================================================================
// GateConfig
// ============================================================================

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// 是否启用决策缓存
    pub cache_enabled: bool,
    /// 缓存 TTL 兜底（默认无，失效完全由事件驱动）
    pub cache_ttl: Option<Duration>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl: None,
        }
    }
}

// ============================================================================
// Gate
// ============================================================================

/// 授权决策引擎
///
/// 设计为多个并发调用方无同步共享读取：能力注册表在启动阶段
/// 写入后只读，图采用写时复制快照，缓存是并发映射。
/// `check` 是纯内存计算，除审计汇外不会阻塞在外部 I/O 上。
pub struct Gate {
    registry: Arc<AbilityRegistry>,
    graph: Arc<RolePermissionGraph>,
    evaluator: Evaluator,
    cache: DecisionCache,
    before_hooks: RwLock<Vec<Arc<dyn BeforeHook>>>,
    after_hooks: RwLock<Vec<Arc<dyn AfterHook>>>,
    audit: Arc<dyn AuditSink>,
    config: GateConfig,
}

impl Gate {
    /// 创建引擎构建器
    pub fn builder(source: impl GraphSource + 'static) -> GateBuilder {
        GateBuilder::new(source)
    }

    /// 使用默认配置创建引擎（无审计、无钩子）
    pub fn new(source: impl GraphSource + 'static) -> Self {
        let registry = Arc::new(AbilityRegistry::new());
        let graph = Arc::new(RolePermissionGraph::new(Arc::new(source)));
        let evaluator = Evaluator::new(Arc::clone(&registry), Arc::clone(&graph));

        Self {
            registry,
            graph,
            evaluator,
            cache: DecisionCache::new(),
            before_hooks: RwLock::new(Vec::new()),
            after_hooks: RwLock::new(Vec::new()),
            audit: Arc::new(NoOpAuditSink::new()),
            config: GateConfig::default(),
        }
    }

    /// 执行授权检查
    ///
    /// 仅在主体结构无效（空标识符）时返回错误；未注册的能力
    /// 解析为拒绝而不是错误（fail-closed）。
    pub fn check(
        &self,
        principal: &Principal,
        ability: &str,
        resource: Option<&Resource>,
    ) -> Result<Decision> {
        if !principal.is_valid() {
            return Err(Error::unknown_principal("empty principal identifier"));
        }

        let fingerprint = resource_fingerprint(resource);
        let key = CacheKey::new(&principal.id, ability, &fingerprint);

        // 1. 缓存查找
        if self.config.cache_enabled {
            if let Some(decision) = self.cache.get(&key) {
                self.audit.record(DecisionRecord::new(
                    &principal.id,
                    ability,
                    &fingerprint,
                    &decision,
                    true,
                ));
                return Ok(decision);
            }
        }

        // 2. 前置钩子：首个非空获胜
        let before_hooks = self.before_hooks.read().unwrap().clone();
        let mut decision = None;
        for hook in &before_hooks {
            if let Some(d) = hook.before(principal, ability, resource) {
                decision = Some(d.with_source(DecisionSource::BeforeHook));
                break;
            }
        }

        // 3. 规则评估（无前置钩子短路时）
        let mut decision = match decision {
            Some(d) => d,
            None => self.evaluator.evaluate(principal, ability, resource),
        };

        // 4. 后置钩子：最后获胜
        let after_hooks = self.after_hooks.read().unwrap().clone();
        for hook in &after_hooks {
            if let Some(d) = hook.after(principal, ability, resource, &decision) {
                decision = d.with_source(DecisionSource::AfterHookOverride);
            }
        }

        // 5. 审计与缓存
        self.audit.record(DecisionRecord::new(
            &principal.id,
            ability,
            &fingerprint,
            &decision,
            false,
        ));
        if self.config.cache_enabled {
            self.cache
                .insert(key, decision.clone(), principal.roles.clone());
        }

        Ok(decision)
    }

    /// 检查是否允许（便捷包装）
    ///
    /// 错误与歧义一律折叠为拒绝
    pub fn allows(&self, principal: &Principal, ability: &str, resource: Option<&Resource>) -> bool {
        self.check(principal, ability, resource)
            .map(|d| d.is_allowed())
            .unwrap_or(false)
    }

    /// 检查是否拒绝（便捷包装）
    pub fn denies(&self, principal: &Principal, ability: &str, resource: Option<&Resource>) -> bool {
        !self.allows(principal, ability, resource)
    }

    /// 主体的角色集合变化后调用
    ///
    /// 从数据源重新读取主体的角色边，然后整体清除该主体的缓存条目。
    /// 调用方必须在发出依赖新图的 `check` 之前完成此调用——
    /// 引擎不轮询变更。
    pub fn invalidate_principal(&self, principal_id: &str) -> Result<()> {
        self.graph.refresh_principal(principal_id)?;
        self.cache.invalidate_principal(principal_id);
        Ok(())
    }

    /// 角色的权限集合变化后调用
    ///
    /// 从数据源重新读取角色的权限边，然后清除所有持有该角色的
    /// 主体的缓存条目
    pub fn invalidate_role(&self, role_id: &str) -> Result<()> {
        self.graph.refresh_role(role_id)?;
        self.cache.invalidate_role(role_id);
        Ok(())
    }

    /// 注册能力谓词（启动阶段使用）
    pub fn register_ability(
        &self,
        name: impl Into<String>,
        predicate: impl AbilityPredicate + 'static,
    ) -> Result<()> {
        self.registry.register(name, predicate)
    }

    /// 追加前置钩子
    pub fn before(&self, hook: impl BeforeHook + 'static) {
        self.before_hooks.write().unwrap().push(Arc::new(hook));
    }

    /// 追加后置钩子
    pub fn after(&self, hook: impl AfterHook + 'static) {
        self.after_hooks.write().unwrap().push(Arc::new(hook));
    }

    /// 获取能力注册表
    pub fn registry(&self) -> &AbilityRegistry {
        &self.registry
    }

    /// 获取角色-权限图
    pub fn graph(&self) -> &RolePermissionGraph {
        &self.graph
    }

    /// 获取缓存统计信息
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// GateBuilder
// ============================================================================

/// 引擎构建器
///
/// 供宿主应用的启动流程装配引擎：注册能力、挂接钩子、
/// 指定审计汇和配置。能力名冲突在 `build` 时报告。
pub struct GateBuilder {
    source: Arc<dyn GraphSource>,
    audit: Arc<dyn AuditSink>,
    config: GateConfig,
    before_hooks: Vec<Arc<dyn BeforeHook>>,
    after_hooks: Vec<Arc<dyn AfterHook>>,
    abilities: Vec<AbilityDef>,
}

impl GateBuilder {
    /// 创建新的构建器
    pub fn new(source: impl GraphSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
            audit: Arc::new(NoOpAuditSink::new()),
            config: GateConfig::default(),
            before_hooks: Vec::new(),
            after_hooks: Vec::new(),
            abilities: Vec::new(),
        }
    }

    /// 设置审计汇
    pub fn audit(mut self, sink: impl AuditSink + 'static) -> Self {
        self.audit = Arc::new(sink);
        self
    }

    /// 设置配置
    pub fn config(mut self, config: GateConfig) -> Self {
        self.config = config;
        self
    }

    /// 禁用决策缓存
    pub fn without_cache(mut self) -> Self {
        self.config.cache_enabled = false;
        self
    }

    /// 设置缓存 TTL 兜底
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = Some(ttl);
        self
    }

    /// 注册能力谓词
    pub fn ability(
        mut self,
        name: impl Into<String>,
        predicate: impl AbilityPredicate + 'static,
    ) -> Self {
        self.abilities.push(AbilityDef::new(name, predicate));
        self
    }

    /// 注册完整的能力定义
    pub fn ability_def(mut self, def: AbilityDef) -> Self {
        self.abilities.push(def);
        self
    }

    /// 添加前置钩子
    pub fn before(mut self, hook: impl BeforeHook + 'static) -> Self {
        self.before_hooks.push(Arc::new(hook));
        self
    }

    /// 添加后置钩子
    pub fn after(mut self, hook: impl AfterHook + 'static) -> Self {
        self.after_hooks.push(Arc::new(hook));
        self
    }

    /// 构建引擎
    ///
    /// 能力名重复时返回 [`Error::DuplicateAbility`]
    pub fn build(self) -> Result<Gate> {
        let registry = Arc::new(AbilityRegistry::new());
        for def in self.abilities {
            registry.register_def(def)?;
        }

        let graph = Arc::new(RolePermissionGraph::new(self.source));
        let evaluator = Evaluator::new(Arc::clone(&registry), Arc::clone(&graph));
        let cache = match self.config.cache_ttl {
            Some(ttl) => DecisionCache::with_ttl(ttl),
            None => DecisionCache::new(),
        };

        Ok(Gate {
            registry,
            graph,
            evaluator,
            cache,
            before_hooks: RwLock::new(self.before_hooks),
            after_hooks: RwLock::new(self.after_hooks),
            audit: self.audit,
            config: self.config,
        })
    }
}
