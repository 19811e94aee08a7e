//! 角色-权限图模块
//!
//! 维护主体→角色、角色→权限关联的内存快照，并回答
//! "主体 P 是否通过其任一角色持有权限 X" 这类查询。
//!
//! 图的读取是多数场景；写入只发生在刷新时。内部采用写时复制快照：
//! 读取方克隆 `Arc` 后在快照上操作，刷新方构建新快照后整体替换，
//! 读取永远不会持锁跨越谓词调用。
//!
//! 角色和权限的关联由外部管理层修改并持久化，本模块只通过
//! [`GraphSource`] 重新读取当前边集——引擎不轮询变更，
//! 管理层在持久化变更后必须调用刷新/失效接口。
//!
//! ## 示例
//!
//! ```rust
//! use authzrs::{InMemoryGraphSource, Principal, Role, RolePermissionGraph};
//! use std::sync::Arc;
//!
//! let source = InMemoryGraphSource::new();
//! source.add_role(Role::new("editor").with_permission("edit-post"));
//! source.assign_role("alice", "editor");
//!
//! let graph = RolePermissionGraph::new(Arc::new(source));
//! graph.refresh_principal("alice").unwrap();
//!
//! let alice = Principal::new("alice").with_role("editor");
//! assert!(graph.has_permission(&alice, "edit-post"));
//! assert!(!graph.has_permission(&alice, "delete-post"));
//! ```

use crate::error::Result;
use crate::principal::Principal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// 权限定义
///
/// 权限只是一个命名标识符，本身不携带逻辑——含义由引用它的
/// 能力定义或图成员关系检查赋予。标识符一旦创建不可变更，
/// 改名通过删除+新建完成。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    /// 权限标识符（唯一，如 "edit-post"）
    pub id: String,
    /// 人类可读名称
    pub name: String,
}

impl Permission {
    /// 创建新的权限（名称默认与标识符相同）
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
        }
    }

    /// 设置人类可读名称
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 获取权限标识符
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 获取人类可读名称
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// 角色定义
///
/// 角色是一组权限标识符的集合。角色是扁平的——本核心刻意不支持
/// 角色间继承，主体到角色的成员关系是唯一的层级。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// 角色标识符（唯一）
    pub id: String,
    /// 人类可读名称
    pub name: String,
    /// 此角色持有的权限标识符集合
    pub permissions: HashSet<String>,
}

impl Role {
    /// 创建新的角色（名称默认与标识符相同）
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            permissions: HashSet::new(),
        }
    }

    /// 设置人类可读名称
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 添加权限
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    /// 添加多个权限
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    /// 获取角色标识符
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 获取人类可读名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 检查角色是否持有权限
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

// ============================================================================
// GraphSource Trait
// ============================================================================

/// 图数据源 trait
///
/// 角色/权限/分配记录的持久化属于外部管理层，本库通过这个
/// 窄读取接口在刷新时重新读取当前边集。
pub trait GraphSource: Send + Sync {
    /// 加载主体当前持有的角色标识符
    fn load_roles_for_principal(&self, principal_id: &str) -> Result<Vec<String>>;

    /// 加载角色当前持有的权限标识符
    fn load_permissions_for_role(&self, role_id: &str) -> Result<Vec<String>>;
}

// ============================================================================
// InMemoryGraphSource
// ============================================================================

#[derive(Debug, Default)]
struct GraphSourceInner {
    principal_roles: HashMap<String, HashSet<String>>,
    roles: HashMap<String, Role>,
}

/// 内存图数据源
///
/// 用于测试和开发环境，同时充当外部管理接口的最小实现：
/// 提供角色分配和权限授予/撤销操作。克隆共享底层状态。
#[derive(Debug, Default, Clone)]
pub struct InMemoryGraphSource {
    inner: Arc<RwLock<GraphSourceInner>>,
}

impl InMemoryGraphSource {
    /// 创建新的内存数据源
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(GraphSourceInner::default())),
        }
    }

    /// 添加角色定义
    pub fn add_role(&self, role: Role) {
        self.inner.write().unwrap().roles.insert(role.id.clone(), role);
    }

    /// 获取角色定义
    pub fn get_role(&self, role_id: &str) -> Option<Role> {
        self.inner.read().unwrap().roles.get(role_id).cloned()
    }

    /// 将角色分配给主体
    pub fn assign_role(&self, principal_id: impl Into<String>, role_id: impl Into<String>) {
        self.inner
            .write()
            .unwrap()
            .principal_roles
            .entry(principal_id.into())
            .or_default()
            .insert(role_id.into());
    }

    /// 撤销主体的角色
    pub fn revoke_role(&self, principal_id: &str, role_id: &str) -> bool {
        let mut inner = self.inner.write().unwrap();
        match inner.principal_roles.get_mut(principal_id) {
            Some(roles) => roles.remove(role_id),
            None => false,
        }
    }

    /// 授予角色权限
    ///
    /// 角色不存在时自动创建
    pub fn grant_permission(&self, role_id: impl Into<String>, permission: impl Into<String>) {
        let role_id = role_id.into();
        let mut inner = self.inner.write().unwrap();
        inner
            .roles
            .entry(role_id.clone())
            .or_insert_with(|| Role::new(role_id))
            .permissions
            .insert(permission.into());
    }

    /// 撤销角色的权限
    pub fn revoke_permission(&self, role_id: &str, permission: &str) -> bool {
        let mut inner = self.inner.write().unwrap();
        match inner.roles.get_mut(role_id) {
            Some(role) => role.permissions.remove(permission),
            None => false,
        }
    }
}

impl GraphSource for InMemoryGraphSource {
    fn load_roles_for_principal(&self, principal_id: &str) -> Result<Vec<String>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .principal_roles
            .get(principal_id)
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn load_permissions_for_role(&self, role_id: &str) -> Result<Vec<String>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .roles
            .get(role_id)
            .map(|role| role.permissions.iter().cloned().collect())
            .unwrap_or_default())
    }
}

// ============================================================================
// RolePermissionGraph
// ============================================================================

/// 图快照
///
/// 一个不可变的边集视图。刷新构建新快照后整体替换旧快照
#[derive(Debug, Default, Clone)]
struct GraphSnapshot {
    /// 主体 -> 角色标识符集合
    principal_roles: HashMap<String, HashSet<String>>,
    /// 角色 -> 权限标识符集合
    role_permissions: HashMap<String, HashSet<String>>,
}

/// 角色-权限图
///
/// 回答权限成员关系查询。权限检查是角色上的扁平 OR：
/// 主体任一角色持有权限即通过，没有否定权限，也没有优先级规则。
pub struct RolePermissionGraph {
    source: Arc<dyn GraphSource>,
    snapshot: RwLock<Arc<GraphSnapshot>>,
}

impl std::fmt::Debug for RolePermissionGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RolePermissionGraph")
            .field("snapshot", &self.current())
            .finish_non_exhaustive()
    }
}

impl RolePermissionGraph {
    /// 创建新的图，初始快照为空
    ///
    /// 管理层通过刷新接口推入边集之前，所有成员关系查询都返回否
    pub fn new(source: Arc<dyn GraphSource>) -> Self {
        Self {
            source,
            snapshot: RwLock::new(Arc::new(GraphSnapshot::default())),
        }
    }

    /// 获取当前快照（克隆 Arc，不持锁）
    fn current(&self) -> Arc<GraphSnapshot> {
        Arc::clone(&self.snapshot.read().unwrap())
    }

    /// 检查主体是否通过其任一角色持有权限
    ///
    /// 遍历主体快照中的角色集合，与图中的角色→权限边求并集
    pub fn has_permission(&self, principal: &Principal, permission: &str) -> bool {
        let snapshot = self.current();
        principal.roles.iter().any(|role| {
            snapshot
                .role_permissions
                .get(role)
                .is_some_and(|perms| perms.contains(permission))
        })
    }

    /// 检查角色是否持有权限
    pub fn role_has_permission(&self, role_id: &str, permission: &str) -> bool {
        self.current()
            .role_permissions
            .get(role_id)
            .is_some_and(|perms| perms.contains(permission))
    }

    /// 获取主体的角色集合（来自图快照）
    pub fn roles_of(&self, principal_id: &str) -> HashSet<String> {
        self.current()
            .principal_roles
            .get(principal_id)
            .cloned()
            .unwrap_or_default()
    }

    /// 获取角色的权限集合
    pub fn permissions_of(&self, role_id: &str) -> HashSet<String> {
        self.current()
            .role_permissions
            .get(role_id)
            .cloned()
            .unwrap_or_default()
    }

    /// 获取当前持有指定角色的主体列表（反向索引）
    pub fn principals_with_role(&self, role_id: &str) -> Vec<String> {
        self.current()
            .principal_roles
            .iter()
            .filter(|(_, roles)| roles.contains(role_id))
            .map(|(principal, _)| principal.clone())
            .collect()
    }

    /// 刷新主体的角色边
    ///
    /// 重新读取主体的角色列表，并加载快照中尚未出现的角色的权限集合
    pub fn refresh_principal(&self, principal_id: &str) -> Result<()> {
        let roles = self.source.load_roles_for_principal(principal_id)?;

        // 在持图锁之前完成所有数据源读取
        let mut loaded = Vec::new();
        {
            let snapshot = self.current();
            for role in &roles {
                if !snapshot.role_permissions.contains_key(role) {
                    let permissions = self.source.load_permissions_for_role(role)?;
                    loaded.push((role.clone(), permissions));
                }
            }
        }

        let mut guard = self.snapshot.write().unwrap();
        let mut next = (**guard).clone();
        next.principal_roles
            .insert(principal_id.to_string(), roles.into_iter().collect());
        for (role, permissions) in loaded {
            next.role_permissions
                .insert(role, permissions.into_iter().collect());
        }
        *guard = Arc::new(next);
        Ok(())
    }

    /// 刷新角色的权限边
    pub fn refresh_role(&self, role_id: &str) -> Result<()> {
        let permissions = self.source.load_permissions_for_role(role_id)?;

        let mut guard = self.snapshot.write().unwrap();
        let mut next = (**guard).clone();
        next.role_permissions
            .insert(role_id.to_string(), permissions.into_iter().collect());
        *guard = Arc::new(next);
        Ok(())
    }
}
