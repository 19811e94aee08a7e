//! 集成测试：决策引擎
//!
//! 测试检查流水线的完整语义：前置钩子短路、注册表谓词、
//! 图成员关系兜底、后置钩子覆盖、审计和 fail-closed 默认拒绝。

use authzrs::{
    Decision, DecisionSource, Error, Gate, InMemoryAuditSink, InMemoryGraphSource, Outcome,
    Principal, Resource, Role,
};

fn blog_source() -> InMemoryGraphSource {
    let source = InMemoryGraphSource::new();
    source.add_role(
        Role::new("editor")
            .with_name("Content Editor")
            .with_permissions(["edit-post", "create-post"]),
    );
    source.add_role(Role::new("viewer").with_permission("view-post"));
    source.assign_role("alice", "editor");
    source.assign_role("bob", "viewer");
    source
}

/// 测试无角色、无钩子、无注册能力的主体得到默认拒绝
#[test]
fn test_default_deny_for_unknown_everything() {
    let gate = Gate::new(InMemoryGraphSource::new());

    let decision = gate
        .check(&Principal::new("stranger"), "launch-rocket", None)
        .unwrap();

    assert_eq!(decision.outcome, Outcome::Deny);
    assert_eq!(decision.source, DecisionSource::DefaultDeny);
    assert!(!decision.reason.is_empty());
}

/// 测试图成员关系允许：主体通过角色持有裸权限
#[test]
fn test_graph_membership_grants_bare_permission() {
    let gate = Gate::new(blog_source());
    gate.invalidate_principal("alice").unwrap();
    gate.invalidate_principal("bob").unwrap();

    let alice = Principal::new("alice").with_role("editor");
    let bob = Principal::new("bob").with_role("viewer");

    assert!(gate.allows(&alice, "edit-post", None));
    assert!(gate.allows(&alice, "create-post", None));
    assert!(gate.denies(&alice, "view-post", None));

    assert!(gate.allows(&bob, "view-post", None));
    assert!(gate.denies(&bob, "edit-post", None));
}

/// 测试资源感知谓词："所有者可更新"
#[test]
fn test_ownership_predicate() {
    let gate = Gate::builder(InMemoryGraphSource::new())
        .ability(
            "update-post",
            |principal: &Principal, resource: Option<&Resource>| match resource {
                Some(r) if r.owned_by(principal.id()) => Decision::allow("owner"),
                _ => Decision::deny("not owner"),
            },
        )
        .build()
        .unwrap();

    let alice = Principal::new("alice");
    let own_post = Resource::new("post", "1").with_owner("alice");
    let other_post = Resource::new("post", "2").with_owner("bob");

    assert!(gate.allows(&alice, "update-post", Some(&own_post)));
    assert!(gate.denies(&alice, "update-post", Some(&other_post)));
    // 无资源时谓词看到 None，同样拒绝
    assert!(gate.denies(&alice, "update-post", None));
}

/// 测试注册表谓词优先于图成员关系
#[test]
fn test_registry_precedence_over_graph() {
    let source = blog_source();
    let gate = Gate::builder(source)
        .ability("edit-post", |_: &Principal, _: Option<&Resource>| {
            Decision::deny("editing is frozen")
        })
        .build()
        .unwrap();
    gate.invalidate_principal("alice").unwrap();

    // alice 的角色持有 edit-post，但注册表谓词说了算
    let alice = Principal::new("alice").with_role("editor");
    let decision = gate.check(&alice, "edit-post", None).unwrap();
    assert!(decision.is_denied());
    assert_eq!(decision.source, DecisionSource::Registry);
    assert_eq!(decision.reason, "editing is frozen");
}

/// 测试超级管理员前置钩子短路规则评估器
///
/// 谓词被设计为 panic，只要钩子短路生效，谓词就不会被调用
#[test]
fn test_super_admin_before_hook_short_circuits() {
    let gate = Gate::builder(InMemoryGraphSource::new())
        .ability("edit-post", |_: &Principal, _: Option<&Resource>| {
            panic!("predicate must not run for super admins")
        })
        .before(|principal: &Principal, _: &str, _: Option<&Resource>| {
            if principal.attribute_is_true("super_admin") {
                Some(Decision::allow("super admin bypass"))
            } else {
                None
            }
        })
        .build()
        .unwrap();

    let admin = Principal::new("root").with_attribute("super_admin", "true");
    let decision = gate.check(&admin, "edit-post", None).unwrap();
    assert!(decision.is_allowed());
    assert_eq!(decision.source, DecisionSource::BeforeHook);

    // 非管理员走正常流程：谓词 panic 被捕获并转换为拒绝
    let user = Principal::new("mallory");
    let decision = gate.check(&user, "edit-post", None).unwrap();
    assert!(decision.is_denied());
    assert_eq!(decision.source, DecisionSource::DefaultDeny);
    assert!(decision.reason.starts_with("evaluator panic:"));
}

/// 测试后置钩子覆盖，多个钩子时最后返回决策的获胜
#[test]
fn test_after_hook_override() {
    let gate = Gate::builder(blog_source())
        .after(
            |principal: &Principal, _: &str, _: Option<&Resource>, decision: &Decision| {
                // 维护窗口：把所有允许降级为拒绝
                if decision.is_allowed() && !principal.has_role("oncall") {
                    Some(Decision::deny("maintenance window"))
                } else {
                    None
                }
            },
        )
        .build()
        .unwrap();
    gate.invalidate_principal("alice").unwrap();

    let alice = Principal::new("alice").with_role("editor");
    let decision = gate.check(&alice, "edit-post", None).unwrap();
    assert!(decision.is_denied());
    assert_eq!(decision.source, DecisionSource::AfterHookOverride);
    assert_eq!(decision.reason, "maintenance window");

    let oncall = Principal::new("carol").with_role("oncall");
    // 钩子放行但底层决策本来就是拒绝
    assert!(gate.denies(&oncall, "edit-post", None));
}

/// 测试空主体标识符返回结构性错误，便捷包装折叠为拒绝
#[test]
fn test_structurally_invalid_principal() {
    let gate = Gate::new(InMemoryGraphSource::new());

    let err = gate.check(&Principal::new(""), "edit-post", None).unwrap_err();
    assert!(matches!(err, Error::UnknownPrincipal(_)));

    let err = gate.check(&Principal::new("   "), "edit-post", None).unwrap_err();
    assert!(matches!(err, Error::UnknownPrincipal(_)));

    assert!(!gate.allows(&Principal::new(""), "edit-post", None));
    assert!(gate.denies(&Principal::new(""), "edit-post", None));
}

/// 测试能力名冲突在构建时报告
#[test]
fn test_duplicate_ability_rejected_at_build() {
    fn always_allow(_: &Principal, _: Option<&Resource>) -> Decision {
        Decision::allow("ok")
    }

    let result = Gate::builder(InMemoryGraphSource::new())
        .ability("edit-post", always_allow)
        .ability("edit-post", always_allow)
        .build();

    match result {
        Err(Error::DuplicateAbility(name)) => assert_eq!(name, "edit-post"),
        other => panic!("expected DuplicateAbility, got {:?}", other.map(|_| ())),
    }
}

/// 测试运行期重复注册保留原有谓词
#[test]
fn test_runtime_duplicate_registration_keeps_original() {
    let gate = Gate::builder(InMemoryGraphSource::new())
        .without_cache()
        .ability("view-post", |_: &Principal, _: Option<&Resource>| {
            Decision::allow("original predicate")
        })
        .build()
        .unwrap();

    let err = gate
        .register_ability("view-post", |_: &Principal, _: Option<&Resource>| {
            Decision::deny("impostor predicate")
        })
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateAbility(_)));

    // 原有谓词仍然生效
    let decision = gate.check(&Principal::new("alice"), "view-post", None).unwrap();
    assert!(decision.is_allowed());
    assert_eq!(decision.reason, "original predicate");
}

/// 测试每次检查都产生审计记录，缓存命中带 cached 标记
#[test]
fn test_audit_trail() {
    let sink = InMemoryAuditSink::new();
    let gate = Gate::builder(blog_source()).audit(sink.clone()).build().unwrap();
    gate.invalidate_principal("alice").unwrap();

    let alice = Principal::new("alice").with_role("editor");
    gate.check(&alice, "edit-post", None).unwrap();
    gate.check(&alice, "edit-post", None).unwrap();
    gate.check(&alice, "delete-post", None).unwrap();

    assert_eq!(sink.record_count(), 3);

    let records = sink.records();
    assert!(!records[0].cached);
    assert!(records[1].cached);
    // 缓存命中的记录与原决策内容一致
    assert_eq!(records[0].outcome, records[1].outcome);
    assert_eq!(records[0].source, records[1].source);
    assert_eq!(records[0].reason, records[1].reason);

    let denied = sink.denied_records();
    assert_eq!(denied.len(), 1);
    assert_eq!(denied[0].ability, "delete-post");
    assert_eq!(denied[0].source.to_string(), "default_deny");

    let stats = sink.stats();
    assert_eq!(stats.allow_count, 2);
    assert_eq!(stats.deny_count, 1);
    assert_eq!(stats.cached_count, 1);
}

/// 测试引擎装配后仍可追加钩子
#[test]
fn test_hooks_can_be_added_after_build() {
    let gate = Gate::builder(InMemoryGraphSource::new()).without_cache().build().unwrap();
    let alice = Principal::new("alice");

    assert!(gate.denies(&alice, "view-post", None));

    gate.before(|_: &Principal, ability: &str, _: Option<&Resource>| {
        if ability == "view-post" {
            Some(Decision::allow("viewing is public"))
        } else {
            None
        }
    });

    assert!(gate.allows(&alice, "view-post", None));
    assert!(gate.denies(&alice, "edit-post", None));
}

/// 测试权限变更 + 失效后决策被重新计算
#[test]
fn test_grant_then_invalidate_recomputes() {
    let source = blog_source();
    let gate = Gate::new(source.clone());
    gate.invalidate_principal("bob").unwrap();

    let bob = Principal::new("bob").with_role("viewer");

    // 初始拒绝被缓存
    assert!(gate.denies(&bob, "edit-post", None));

    source.grant_permission("viewer", "edit-post");
    gate.invalidate_role("viewer").unwrap();

    let decision = gate.check(&bob, "edit-post", None).unwrap();
    assert!(decision.is_allowed());
    assert_eq!(decision.source, DecisionSource::GraphMembership);
}

/// 测试角色撤销 + 失效后允许变为拒绝
#[test]
fn test_revoke_role_then_invalidate() {
    let source = blog_source();
    let gate = Gate::new(source.clone());
    gate.invalidate_principal("alice").unwrap();

    let alice = Principal::new("alice").with_role("editor");
    assert!(gate.allows(&alice, "edit-post", None));

    source.revoke_role("alice", "editor");
    gate.invalidate_principal("alice").unwrap();

    // 图快照已更新；调用方此后传入的主体不再携带 editor 角色
    let alice = Principal::new("alice");
    assert!(gate.denies(&alice, "edit-post", None));
}
