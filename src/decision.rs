//! 决策类型模块
//!
//! 定义授权检查的决策结果类型。决策一旦构造即不可变，
//! 且永远携带明确的结果（Allow 或 Deny）——默认拒绝（fail-closed）。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 决策结果
///
/// 授权检查只有两种结果：允许或拒绝。缺省为拒绝。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Outcome {
    /// 允许访问
    Allow,
    /// 拒绝访问
    #[default]
    Deny,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Allow => write!(f, "allow"),
            Outcome::Deny => write!(f, "deny"),
        }
    }
}

/// 决策来源
///
/// 记录决策是由检查流程的哪个阶段产生的，用于审计和调试。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DecisionSource {
    /// 前置钩子短路
    BeforeHook,
    /// 注册表中的能力谓词
    Registry,
    /// 角色-权限图成员关系
    GraphMembership,
    /// 后置钩子覆盖
    AfterHookOverride,
    /// 默认拒绝（没有任何钩子、谓词或图成员关系解析该能力）
    #[default]
    DefaultDeny,
}

impl fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionSource::BeforeHook => write!(f, "before_hook"),
            DecisionSource::Registry => write!(f, "registry"),
            DecisionSource::GraphMembership => write!(f, "graph_membership"),
            DecisionSource::AfterHookOverride => write!(f, "after_hook_override"),
            DecisionSource::DefaultDeny => write!(f, "default_deny"),
        }
    }
}

/// 授权决策
///
/// 一次授权检查的完整结果。`outcome` 永远存在，
/// `reason` 适合写入日志，但不应原样暴露给不受信任的终端用户。
///
/// ## 示例
///
/// ```rust
/// use authzrs::{Decision, DecisionSource, Outcome};
///
/// let decision = Decision::allow("owner matches").with_source(DecisionSource::Registry);
/// assert!(decision.is_allowed());
/// assert_eq!(decision.source, DecisionSource::Registry);
///
/// let denied = Decision::default_deny();
/// assert!(denied.is_denied());
/// assert_eq!(denied.outcome, Outcome::Deny);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// 决策结果
    pub outcome: Outcome,
    /// 决策原因（用于日志）
    pub reason: String,
    /// 决策来源
    pub source: DecisionSource,
}

impl Decision {
    /// 创建允许决策
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Allow,
            reason: reason.into(),
            source: DecisionSource::default(),
        }
    }

    /// 创建拒绝决策
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Deny,
            reason: reason.into(),
            source: DecisionSource::default(),
        }
    }

    /// 创建默认拒绝决策
    ///
    /// 当没有任何钩子、注册谓词或图成员关系能解析能力时使用
    pub fn default_deny() -> Self {
        Self {
            outcome: Outcome::Deny,
            reason: "no rule resolved the ability".to_string(),
            source: DecisionSource::DefaultDeny,
        }
    }

    /// 设置决策来源
    pub fn with_source(mut self, source: DecisionSource) -> Self {
        self.source = source;
        self
    }

    /// 检查是否允许
    pub fn is_allowed(&self) -> bool {
        self.outcome == Outcome::Allow
    }

    /// 检查是否拒绝
    pub fn is_denied(&self) -> bool {
        self.outcome == Outcome::Deny
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.outcome, self.source, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_decision() {
        let decision = Decision::allow("role grants permission");
        assert!(decision.is_allowed());
        assert!(!decision.is_denied());
        assert_eq!(decision.reason, "role grants permission");
    }

    #[test]
    fn test_deny_decision() {
        let decision = Decision::deny("not the owner");
        assert!(decision.is_denied());
        assert!(!decision.is_allowed());
    }

    #[test]
    fn test_default_deny() {
        let decision = Decision::default_deny();
        assert!(decision.is_denied());
        assert_eq!(decision.source, DecisionSource::DefaultDeny);
    }

    #[test]
    fn test_with_source() {
        let decision = Decision::allow("ok").with_source(DecisionSource::GraphMembership);
        assert_eq!(decision.source, DecisionSource::GraphMembership);
    }

    #[test]
    fn test_outcome_default_is_deny() {
        assert_eq!(Outcome::default(), Outcome::Deny);
    }

    #[test]
    fn test_decision_display() {
        let decision = Decision::allow("ok").with_source(DecisionSource::Registry);
        assert_eq!(decision.to_string(), "allow (registry): ok");
    }

    #[test]
    fn test_decision_serialization() {
        let decision = Decision::allow("ok").with_source(DecisionSource::BeforeHook);
        let json = serde_json::to_string(&decision).unwrap();
        let deserialized: Decision = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized, decision);
    }
}
