//! 统一错误类型模块
//!
//! 提供 authzrs 库中所有操作的错误类型定义。

use std::fmt;

/// authzrs 库的统一结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// authzrs 库的错误类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// 能力名称重复注册
    ///
    /// 同名能力只能注册一次，重复注册不会覆盖已有的谓词
    DuplicateAbility(String),

    /// 主体结构无效（如空标识符）
    UnknownPrincipal(String),

    /// 图数据源错误
    ///
    /// 从外部存储加载角色/权限边时失败
    DataSource(String),

    /// 内部错误
    Internal(String),

    /// 其他错误
    Other(String),
}

impl Error {
    /// 创建一个重复能力错误
    pub fn duplicate_ability(name: impl Into<String>) -> Self {
        Error::DuplicateAbility(name.into())
    }

    /// 创建一个无效主体错误
    pub fn unknown_principal(msg: impl Into<String>) -> Self {
        Error::UnknownPrincipal(msg.into())
    }

    /// 创建一个数据源错误
    pub fn data_source(msg: impl Into<String>) -> Self {
        Error::DataSource(msg.into())
    }

    /// 创建一个内部错误
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}

// ============================================================================
// Display 实现
// ============================================================================

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DuplicateAbility(name) => {
                write!(f, "ability '{}' is already registered", name)
            }
            Error::UnknownPrincipal(msg) => write!(f, "invalid principal: {}", msg),
            Error::DataSource(msg) => write!(f, "graph data source error: {}", msg),
            Error::Internal(msg) => write!(f, "internal error: {}", msg),
            Error::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

// ============================================================================
// From 实现 - 方便错误转换
// ============================================================================

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
