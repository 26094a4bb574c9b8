// Copyright (c) 2025, vistone
// All rights reserved.

//! addrpool 按目标地址复用客户端传输连接的连接池
//!
//! 调用方通过 [`Pool::get`] 获取连接（复用或新拨号），使用完毕后通过
//! [`Pool::release`] 归还，出错的连接会被直接关闭；[`Pool::close`] 在退出
//! 时关闭所有空闲连接。

pub mod bucket;
pub mod config;
pub mod connection;
pub mod errors;
pub mod pool;
pub mod stats;
pub mod transport;

pub use bucket::Bucket;
pub use config::{default_config, Config, DEFAULT_POOL_SIZE, DEFAULT_POOL_TTL};
pub use connection::PoolConn;
pub use errors::{PoolError, ReleaseError, ReleaseResult, Result};
pub use pool::Pool;
pub use stats::{Stats, StatsCollector};
pub use transport::{Client, DialOptions, Dialer, TcpClient, TcpDialer};
