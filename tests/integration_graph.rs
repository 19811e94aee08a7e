//! 集成测试：角色-权限图
//!
//! 测试数据源、快照刷新和成员关系查询的完整流程。

use authzrs::{
    Error, GraphSource, InMemoryGraphSource, Principal, Role, RolePermissionGraph,
};
use std::sync::Arc;

fn newsroom() -> (InMemoryGraphSource, RolePermissionGraph) {
    let source = InMemoryGraphSource::new();
    source.add_role(
        Role::new("editor")
            .with_name("Content Editor")
            .with_permissions(["edit-post", "create-post", "publish-post"]),
    );
    source.add_role(Role::new("viewer").with_permission("view-post"));
    source.assign_role("alice", "editor");
    source.assign_role("alice", "viewer");
    source.assign_role("bob", "viewer");

    let graph = RolePermissionGraph::new(Arc::new(source.clone()));
    graph.refresh_principal("alice").unwrap();
    graph.refresh_principal("bob").unwrap();
    (source, graph)
}

/// 测试扁平 OR 成员关系：任一角色持有权限即通过
#[test]
fn test_membership_is_flat_or_over_roles() {
    let (_, graph) = newsroom();

    let alice = Principal::new("alice").with_roles(["editor", "viewer"]);
    assert!(graph.has_permission(&alice, "edit-post"));
    assert!(graph.has_permission(&alice, "view-post"));
    assert!(!graph.has_permission(&alice, "manage-users"));

    let bob = Principal::new("bob").with_role("viewer");
    assert!(graph.has_permission(&bob, "view-post"));
    assert!(!graph.has_permission(&bob, "edit-post"));
}

/// 测试角色不继承：持有权限只看直接的角色→权限边
#[test]
fn test_no_role_inheritance() {
    let (_, graph) = newsroom();

    // viewer 不会因为任何层级关系获得 editor 的权限
    let bob = Principal::new("bob").with_role("viewer");
    assert!(!graph.has_permission(&bob, "publish-post"));
    assert!(graph.role_has_permission("editor", "publish-post"));
    assert!(!graph.role_has_permission("viewer", "publish-post"));
}

/// 测试刷新前快照不变（无轮询语义）
#[test]
fn test_snapshot_is_stable_until_refresh() {
    let (source, graph) = newsroom();

    source.grant_permission("viewer", "edit-post");

    // 数据源已变，但快照还是旧的
    assert!(!graph.role_has_permission("viewer", "edit-post"));

    graph.refresh_role("viewer").unwrap();
    assert!(graph.role_has_permission("viewer", "edit-post"));
}

/// 测试主体刷新同时加载新角色的权限边
#[test]
fn test_refresh_principal_loads_new_role_edges() {
    let source = InMemoryGraphSource::new();
    source.add_role(Role::new("admin").with_permission("manage-users"));
    source.assign_role("carol", "admin");

    let graph = RolePermissionGraph::new(Arc::new(source.clone()));

    // 刷新前图是空的
    assert!(graph.roles_of("carol").is_empty());
    let carol = Principal::new("carol").with_role("admin");
    assert!(!graph.has_permission(&carol, "manage-users"));

    graph.refresh_principal("carol").unwrap();
    assert!(graph.roles_of("carol").contains("admin"));
    assert!(graph.has_permission(&carol, "manage-users"));
}

/// 测试反向索引：列出持有角色的主体
#[test]
fn test_principals_with_role_reverse_index() {
    let (_, graph) = newsroom();

    let mut viewers = graph.principals_with_role("viewer");
    viewers.sort();
    assert_eq!(viewers, vec!["alice", "bob"]);

    let editors = graph.principals_with_role("editor");
    assert_eq!(editors, vec!["alice"]);

    assert!(graph.principals_with_role("ghost-role").is_empty());
}

/// 测试撤销流程：撤销角色分配并刷新
#[test]
fn test_revocation_round_trip() {
    let (source, graph) = newsroom();

    assert!(source.revoke_role("alice", "editor"));
    graph.refresh_principal("alice").unwrap();

    let roles = graph.roles_of("alice");
    assert!(!roles.contains("editor"));
    assert!(roles.contains("viewer"));

    // 重复撤销返回 false
    assert!(!source.revoke_role("alice", "editor"));
}

/// 测试权限撤销并刷新角色边
#[test]
fn test_permission_revocation() {
    let (source, graph) = newsroom();

    assert!(source.revoke_permission("editor", "publish-post"));
    graph.refresh_role("editor").unwrap();

    let alice = Principal::new("alice").with_role("editor");
    assert!(!graph.has_permission(&alice, "publish-post"));
    assert!(graph.has_permission(&alice, "edit-post"));
}

/// 测试数据源失败以错误形式浮出，不被吞掉
#[test]
fn test_data_source_failure_surfaces() {
    struct BrokenSource;

    impl GraphSource for BrokenSource {
        fn load_roles_for_principal(&self, _: &str) -> authzrs::Result<Vec<String>> {
            Err(Error::data_source("connection refused"))
        }

        fn load_permissions_for_role(&self, _: &str) -> authzrs::Result<Vec<String>> {
            Err(Error::data_source("connection refused"))
        }
    }

    let graph = RolePermissionGraph::new(Arc::new(BrokenSource));

    assert!(matches!(
        graph.refresh_principal("alice").unwrap_err(),
        Error::DataSource(_)
    ));
    assert!(matches!(
        graph.refresh_role("editor").unwrap_err(),
        Error::DataSource(_)
    ));

    // 失败的刷新不污染快照
    assert!(graph.roles_of("alice").is_empty());
}

/// 测试未知主体/角色的刷新是无害的
#[test]
fn test_refresh_unknown_entities() {
    let source = InMemoryGraphSource::new();
    let graph = RolePermissionGraph::new(Arc::new(source));

    graph.refresh_principal("nobody").unwrap();
    graph.refresh_role("no-role").unwrap();

    assert!(graph.roles_of("nobody").is_empty());
    assert!(graph.permissions_of("no-role").is_empty());
}
