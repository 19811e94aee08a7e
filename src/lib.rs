//! # AuthzRS
//!
//! 一个基于角色/权限的 Rust 授权决策引擎。
//!
//! 回答一个问题："主体 P 现在能否对资源 R 执行能力 A？"
//! 语义是 fail-closed 的：任何歧义（未注册的能力、空角色集、
//! 谓词 panic）都解析为拒绝，带原因且可审计。
//!
//! ## 功能特性
//!
//! - **能力注册表**: 命名能力到决策谓词的映射，支持资源感知的
//!   自定义规则（如"所有者可编辑"）
//! - **角色-权限图**: 主体 → 角色 → 权限 的扁平成员关系，
//!   写时复制快照支持无锁并发读取
//! - **规则评估器**: 注册表优先、图成员关系兜底，谓词 panic
//!   被捕获并转换为拒绝
//! - **决策引擎**: 前置钩子短路（超级管理员模式）、后置钩子
//!   覆盖（最后获胜）的统一检查入口
//! - **决策缓存**: 按 `(主体, 能力, 资源指纹)` 记忆化，
//!   事件驱动失效，可选 TTL 兜底
//! - **审计**: 每次检查的最终决策送入审计汇，含来源和原因
//!
//! ## 基本用法
//!
//! ```rust
//! use authzrs::{Gate, InMemoryGraphSource, Principal, Role};
//!
//! // 装配角色-权限图的数据源
//! let source = InMemoryGraphSource::new();
//! source.add_role(Role::new("editor").with_permission("edit-post"));
//! source.assign_role("alice", "editor");
//!
//! let gate = Gate::new(source);
//! gate.invalidate_principal("alice").unwrap();
//!
//! let alice = Principal::new("alice").with_role("editor");
//! assert!(gate.allows(&alice, "edit-post", None));
//! assert!(gate.denies(&alice, "delete-post", None));
//! ```
//!
//! ## 资源感知的能力谓词
//!
//! ```rust
//! use authzrs::{Decision, Gate, InMemoryGraphSource, Principal, Resource};
//!
//! let gate = Gate::builder(InMemoryGraphSource::new())
//!     .ability("update-post", |principal: &Principal, resource: Option<&Resource>| {
//!         match resource {
//!             Some(r) if r.owned_by(principal.id()) => Decision::allow("owner"),
//!             _ => Decision::deny("not owner"),
//!         }
//!     })
//!     .build()
//!     .unwrap();
//!
//! let alice = Principal::new("alice");
//! let post = Resource::new("post", "42").with_owner("alice");
//! assert!(gate.allows(&alice, "update-post", Some(&post)));
//! ```
//!
//! ## 钩子示例
//!
//! ```rust
//! use authzrs::{Decision, Gate, InMemoryGraphSource, Principal, Resource};
//!
//! let gate = Gate::builder(InMemoryGraphSource::new())
//!     .before(|principal: &Principal, _: &str, _: Option<&Resource>| {
//!         if principal.attribute_is_true("super_admin") {
//!             Some(Decision::allow("super admin bypass"))
//!         } else {
//!             None
//!         }
//!     })
//!     .build()
//!     .unwrap();
//!
//! let admin = Principal::new("root").with_attribute("super_admin", "true");
//! assert!(gate.allows(&admin, "anything", None));
//! ```

pub mod audit;
pub mod cache;
pub mod decision;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod graph;
pub mod principal;
pub mod registry;

pub use error::{Error, Result};

// ============================================================================
// 决策相关导出
// ============================================================================

pub use decision::{Decision, DecisionSource, Outcome};

// ============================================================================
// 主体与资源导出
// ============================================================================

pub use principal::{resource_fingerprint, Principal, Resource, NO_RESOURCE_FINGERPRINT};

// ============================================================================
// 注册表与图导出
// ============================================================================

pub use registry::{AbilityDef, AbilityPredicate, AbilityRegistry};

pub use graph::{GraphSource, InMemoryGraphSource, Permission, Role, RolePermissionGraph};

// ============================================================================
// 引擎相关导出
// ============================================================================

pub use engine::{AfterHook, BeforeHook, Gate, GateBuilder, GateConfig};

pub use evaluator::Evaluator;

pub use cache::{CacheKey, CacheStats, DecisionCache};

// ============================================================================
// 审计相关导出
// ============================================================================

pub use audit::{AuditSink, AuditStats, DecisionRecord, InMemoryAuditSink, NoOpAuditSink};
