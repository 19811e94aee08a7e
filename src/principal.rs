//! 主体与资源定义模块
//!
//! 提供授权检查的两个输入值类型：
//!
//! - **Principal（主体）**: 已认证的行为者，携带标识符和当前持有的角色集合
//! - **Resource（资源）**: 可选的检查目标，携带类型、标识符和属主信息
//!
//! 两者都是每次决策的不可变快照，由调用方提供，引擎不会修改它们。
//!
//! ## 示例
//!
//! ```rust
//! use authzrs::{Principal, Resource};
//!
//! let alice = Principal::new("alice")
//!     .with_role("editor")
//!     .with_attribute("department", "content");
//!
//! assert!(alice.has_role("editor"));
//!
//! let post = Resource::new("post", "42").with_owner("alice");
//! assert!(post.owned_by(alice.id()));
//! assert_eq!(post.fingerprint(), "post/42");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// 授权主体
///
/// 表示发起检查的已认证行为者。主体的身份和角色成员关系
/// 在进入引擎之前就已经确立——本库不做任何认证工作。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// 主体标识符
    pub id: String,
    /// 主体当前持有的角色标识符集合
    pub roles: HashSet<String>,
    /// 主体属性（如部门、超级管理员标记等）
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
}

impl Principal {
    /// 创建新的主体
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            roles: HashSet::new(),
            attributes: HashMap::new(),
        }
    }

    /// 添加角色
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// 添加多个角色
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    /// 添加属性
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// 获取主体 ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 检查是否持有某个角色
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// 检查是否持有任意一个角色
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|r| self.roles.contains(*r))
    }

    /// 获取属性值
    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|s| s.as_str())
    }

    /// 检查属性是否为 "true"
    pub fn attribute_is_true(&self, key: &str) -> bool {
        self.get_attribute(key) == Some("true")
    }

    /// 检查主体结构是否有效
    ///
    /// 空或全空白的标识符视为无效主体
    pub fn is_valid(&self) -> bool {
        !self.id.trim().is_empty()
    }
}

// ============================================================================
// Resource
// ============================================================================

/// 无资源检查时使用的指纹占位符
pub const NO_RESOURCE_FINGERPRINT: &str = "-";

/// 检查目标资源
///
/// 资源由类型和标识符组成，可以携带属主和任意属性，
/// 供基于属主关系等逻辑的能力谓词使用。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// 资源类型（如 "post"）
    pub kind: String,
    /// 资源标识符
    pub id: String,
    /// 属主的主体标识符
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    /// 资源属性
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
}

impl Resource {
    /// 创建新的资源
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            owner_id: None,
            attributes: HashMap::new(),
        }
    }

    /// 设置属主
    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    /// 添加属性
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// 获取资源类型
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// 获取资源标识符
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 获取属主标识符
    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    /// 检查资源是否属于指定主体
    pub fn owned_by(&self, principal_id: &str) -> bool {
        self.owner_id.as_deref() == Some(principal_id)
    }

    /// 获取属性值
    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|s| s.as_str())
    }

    /// 计算资源指纹
    ///
    /// 指纹是决策缓存键的一部分，格式为 `kind/id`
    pub fn fingerprint(&self) -> String {
        format!("{}/{}", self.kind, self.id)
    }
}

/// 计算可选资源的指纹
///
/// 无资源时返回占位符 [`NO_RESOURCE_FINGERPRINT`]
pub fn resource_fingerprint(resource: Option<&Resource>) -> String {
    match resource {
        Some(r) => r.fingerprint(),
        None => NO_RESOURCE_FINGERPRINT.to_string(),
    }
}
