//! 规则评估器模块
//!
//! 在不涉及钩子和缓存的前提下解析单次能力检查：
//!
//! 1. 注册表中存在同名能力时，调用其谓词并原样返回结果，
//!    来源标记为 `Registry`
//! 2. 否则将能力名视为裸权限标识符，按图成员关系解析：
//!    持有即允许（`GraphMembership`），否则默认拒绝（`DefaultDeny`）
//!
//! 谓词内部的 panic 会被捕获并转换为拒绝决策——评估器缺陷
//! 永远不能让调用方的授权检查崩溃。

use crate::decision::{Decision, DecisionSource};
use crate::graph::RolePermissionGraph;
use crate::principal::{Principal, Resource};
use crate::registry::AbilityRegistry;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// 规则评估器
///
/// 注册表优先、图成员关系兜底的单次检查解析器
#[derive(Debug, Clone)]
pub struct Evaluator {
    registry: Arc<AbilityRegistry>,
    graph: Arc<RolePermissionGraph>,
}

impl Evaluator {
    /// 创建新的评估器
    pub fn new(registry: Arc<AbilityRegistry>, graph: Arc<RolePermissionGraph>) -> Self {
        Self { registry, graph }
    }

    /// 解析一次能力检查
    pub fn evaluate(
        &self,
        principal: &Principal,
        ability: &str,
        resource: Option<&Resource>,
    ) -> Decision {
        if let Some(def) = self.registry.lookup(ability) {
            return self.invoke_predicate(&def, principal, resource);
        }

        // 未注册的能力名按裸权限标识符处理
        if self.graph.has_permission(principal, ability) {
            Decision::allow(format!(
                "principal '{}' holds permission '{}' through a role",
                principal.id, ability
            ))
            .with_source(DecisionSource::GraphMembership)
        } else {
            Decision::default_deny()
        }
    }

    /// 调用谓词并捕获 panic
    fn invoke_predicate(
        &self,
        def: &crate::registry::AbilityDef,
        principal: &Principal,
        resource: Option<&Resource>,
    ) -> Decision {
        let result = panic::catch_unwind(AssertUnwindSafe(|| def.check(principal, resource)));

        match result {
            Ok(decision) => decision.with_source(DecisionSource::Registry),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                Decision::deny(format!("evaluator panic: {}", message))
                    .with_source(DecisionSource::DefaultDeny)
            }
        }
    }
}

/// 从 panic payload 中提取消息
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
