// Copyright (c) 2025, vistone
// All rights reserved.

use crate::connection::PoolConn;
use std::fmt;
use std::io;
use thiserror::Error;

/// 连接池相关错误定义
#[derive(Error, Debug)]
pub enum PoolError {
    /// DialFailed 拨号器无法建立连接
    #[error("拨号失败: {0}")]
    DialFailed(#[source] io::Error),

    /// CloseFailed 关闭底层连接失败（淘汰、容量丢弃、出错丢弃或关闭连接池时）
    #[error("关闭连接失败: {0}")]
    CloseFailed(#[source] io::Error),

    #[error("配置参数无效: {0}")]
    InvalidConfig(&'static str),

    #[error("连接池已关闭")]
    PoolClosed,
}

impl PoolError {
    /// is_dial_failure 是否为拨号失败
    pub fn is_dial_failure(&self) -> bool {
        matches!(self, PoolError::DialFailed(_))
    }

    /// is_close_failure 是否为关闭失败
    pub fn is_close_failure(&self) -> bool {
        matches!(self, PoolError::CloseFailed(_))
    }
}

impl PartialEq for PoolError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::DialFailed(e1), Self::DialFailed(e2)) => e1.kind() == e2.kind(),
            (Self::CloseFailed(e1), Self::CloseFailed(e2)) => e1.kind() == e2.kind(),
            (Self::InvalidConfig(a), Self::InvalidConfig(b)) => a == b,
            (Self::PoolClosed, Self::PoolClosed) => true,
            _ => false,
        }
    }
}

/// 连接池相关错误类型别名
pub type Result<T> = std::result::Result<T, PoolError>;

/// ReleaseError 归还连接失败
///
/// 不属于本连接池的连接会原样交还给调用方，可以再归还给创建它的连接池。
#[derive(Error)]
pub enum ReleaseError<C> {
    /// UnknownConnectionType 归还的连接不是由本连接池创建的
    #[error("unknown connection type")]
    UnknownConnectionType(PoolConn<C>),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl<C> ReleaseError<C> {
    /// into_connection 取回被拒绝的连接
    pub fn into_connection(self) -> Option<PoolConn<C>> {
        match self {
            ReleaseError::UnknownConnectionType(conn) => Some(conn),
            ReleaseError::Pool(_) => None,
        }
    }

    pub fn is_unknown_connection_type(&self) -> bool {
        matches!(self, ReleaseError::UnknownConnectionType(_))
    }

    pub fn is_close_failure(&self) -> bool {
        matches!(self, ReleaseError::Pool(e) if e.is_close_failure())
    }

    /// pool_error 关闭失败等连接池错误
    pub fn pool_error(&self) -> Option<&PoolError> {
        match self {
            ReleaseError::Pool(e) => Some(e),
            ReleaseError::UnknownConnectionType(_) => None,
        }
    }
}

impl<C> fmt::Debug for ReleaseError<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseError::UnknownConnectionType(conn) => {
                f.debug_tuple("UnknownConnectionType").field(conn).finish()
            }
            ReleaseError::Pool(e) => f.debug_tuple("Pool").field(e).finish(),
        }
    }
}

/// 归还连接的结果类型
pub type ReleaseResult<C> = std::result::Result<(), ReleaseError<C>>;
