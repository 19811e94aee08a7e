//! 审计模块
//!
//! 每次授权检查的最终决策都会送入审计汇（Audit Sink），包括：
//!
//! - **决策记录**: 主体、能力、资源指纹、结果、来源和时间
//! - **审计汇 Trait**: 定义记录接口，实现由宿主应用提供
//! - **内存实现**: 用于测试和开发的简单实现
//!
//! 审计从引擎的视角是"发射后不管"：记录接口不可能失败
//! （按构造即无返回值），实现必须是非阻塞/尽力而为的，
//! 缓慢的审计后端不能拖慢授权检查。
//!
//! ## 使用示例
//!
//! ```rust
//! use authzrs::{AuditSink, DecisionRecord, Decision, InMemoryAuditSink};
//!
//! let sink = InMemoryAuditSink::new();
//!
//! sink.record(DecisionRecord::new(
//!     "alice",
//!     "edit-post",
//!     "-",
//!     &Decision::allow("role grants permission"),
//!     false,
//! ));
//!
//! assert_eq!(sink.record_count(), 1);
//! let records = sink.records_for_principal("alice");
//! assert_eq!(records.len(), 1);
//! ```

use crate::decision::{Decision, DecisionSource, Outcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// 决策记录
///
/// 一次授权检查送入审计汇的完整记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// 主体标识符
    pub principal_id: String,
    /// 能力名称
    pub ability: String,
    /// 资源指纹
    pub resource_fingerprint: String,
    /// 决策结果
    pub outcome: Outcome,
    /// 决策原因
    pub reason: String,
    /// 决策来源
    pub source: DecisionSource,
    /// 是否由缓存提供
    pub cached: bool,
    /// 记录时间
    pub timestamp: DateTime<Utc>,
}

impl DecisionRecord {
    /// 创建新的决策记录
    pub fn new(
        principal_id: impl Into<String>,
        ability: impl Into<String>,
        resource_fingerprint: impl Into<String>,
        decision: &Decision,
        cached: bool,
    ) -> Self {
        Self {
            principal_id: principal_id.into(),
            ability: ability.into(),
            resource_fingerprint: resource_fingerprint.into(),
            outcome: decision.outcome,
            reason: decision.reason.clone(),
            source: decision.source,
            cached,
            timestamp: Utc::now(),
        }
    }

    /// 检查记录是否为允许
    pub fn is_allowed(&self) -> bool {
        self.outcome == Outcome::Allow
    }

    /// 检查记录是否为拒绝
    pub fn is_denied(&self) -> bool {
        self.outcome == Outcome::Deny
    }
}

// ============================================================================
// AuditSink Trait
// ============================================================================

/// 审计汇 trait
///
/// 定义决策记录的接收接口。实现必须是非阻塞/尽力而为的：
/// 审计失败由实现内部记录并吞掉，永远不能改变返回给调用方的决策。
pub trait AuditSink: Send + Sync {
    /// 接收一条决策记录
    fn record(&self, record: DecisionRecord);
}

// ============================================================================
// InMemoryAuditSink
// ============================================================================

/// 内存审计汇
///
/// 用于测试和开发环境，将记录存储在内存中。克隆共享底层状态。
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    records: Arc<RwLock<Vec<DecisionRecord>>>,
    max_records: Option<usize>,
}

impl InMemoryAuditSink {
    /// 创建新的内存审计汇
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            max_records: None,
        }
    }

    /// 创建带有最大记录数限制的审计汇
    pub fn with_max_records(max: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            max_records: Some(max),
        }
    }

    /// 获取所有记录
    pub fn records(&self) -> Vec<DecisionRecord> {
        self.records.read().unwrap().clone()
    }

    /// 获取记录数量
    pub fn record_count(&self) -> usize {
        self.records.read().unwrap().len()
    }

    /// 按主体获取记录
    pub fn records_for_principal(&self, principal_id: &str) -> Vec<DecisionRecord> {
        self.records
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.principal_id == principal_id)
            .cloned()
            .collect()
    }

    /// 按能力获取记录
    pub fn records_for_ability(&self, ability: &str) -> Vec<DecisionRecord> {
        self.records
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.ability == ability)
            .cloned()
            .collect()
    }

    /// 获取所有拒绝记录
    pub fn denied_records(&self) -> Vec<DecisionRecord> {
        self.records
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.is_denied())
            .cloned()
            .collect()
    }

    /// 获取最近一条记录
    pub fn last_record(&self) -> Option<DecisionRecord> {
        self.records.read().unwrap().last().cloned()
    }

    /// 清空所有记录
    pub fn clear(&self) {
        self.records.write().unwrap().clear();
    }

    /// 获取统计信息
    pub fn stats(&self) -> AuditStats {
        let records = self.records.read().unwrap();
        let mut stats = AuditStats {
            total_records: records.len(),
            ..Default::default()
        };

        for record in records.iter() {
            match record.outcome {
                Outcome::Allow => stats.allow_count += 1,
                Outcome::Deny => stats.deny_count += 1,
            }
            if record.cached {
                stats.cached_count += 1;
            }
            *stats.records_by_source.entry(record.source.to_string()).or_insert(0) += 1;
        }

        stats
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, record: DecisionRecord) {
        let mut records = self.records.write().unwrap();

        // 如果设置了最大记录数，删除最旧的记录
        if let Some(max) = self.max_records {
            while records.len() >= max {
                records.remove(0);
            }
        }

        records.push(record);
    }
}

impl Clone for InMemoryAuditSink {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            max_records: self.max_records,
        }
    }
}

/// 审计统计信息
#[derive(Debug, Default, Clone)]
pub struct AuditStats {
    /// 总记录数
    pub total_records: usize,
    /// 允许决策数
    pub allow_count: usize,
    /// 拒绝决策数
    pub deny_count: usize,
    /// 缓存命中提供的决策数
    pub cached_count: usize,
    /// 按来源统计
    pub records_by_source: HashMap<String, usize>,
}

// ============================================================================
// NoOpAuditSink
// ============================================================================

/// 空操作审计汇
///
/// 不执行任何操作，用于禁用审计
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpAuditSink;

impl NoOpAuditSink {
    /// 创建新的空操作审计汇
    pub fn new() -> Self {
        Self
    }
}

impl AuditSink for NoOpAuditSink {
    fn record(&self, _record: DecisionRecord) {
        // 不执行任何操作
    }
}

// ============================================================================
// 测试
// ============================================================================
