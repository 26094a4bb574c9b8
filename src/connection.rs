// Copyright (c) 2025, vistone
// All rights reserved.

use crate::transport::Client;
use std::fmt;
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// PoolConn 连接池管理的连接
///
/// 包装一个底层传输连接，并记录唯一标识符和创建时间。对外的 `close`
/// 是空操作：连接的生命周期只由连接池决定（过期淘汰、容量丢弃、
/// 出错丢弃、关闭连接池），调用方无法提前销毁池仍在管理的资源。
pub struct PoolConn<C> {
    /// ID 连接唯一标识符，仅用于诊断
    id: String,

    /// CreatedAt 创建时间
    created: Instant,

    /// 创建该连接的连接池标识
    pool_id: u64,

    /// 底层连接
    client: C,
}

impl<C: Client> PoolConn<C> {
    pub(crate) fn new(client: C, pool_id: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created: Instant::now(),
            pool_id,
            client,
        }
    }

    /// id 获取连接标识符
    pub fn id(&self) -> &str {
        &self.id
    }

    /// created 获取创建时间
    pub fn created(&self) -> Instant {
        self.created
    }

    /// age 获取连接年龄
    pub fn age(&self) -> Duration {
        self.created.elapsed()
    }

    /// is_expired 年龄是否已超过 ttl
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() > ttl
    }

    pub(crate) fn pool_id(&self) -> u64 {
        self.pool_id
    }

    /// 真正关闭底层连接，只能由连接池调用
    pub(crate) fn close_inner(&mut self) -> io::Result<()> {
        self.client.close()
    }
}

impl<C> fmt::Debug for PoolConn<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConn")
            .field("id", &self.id)
            .field("created", &self.created)
            .field("pool_id", &self.pool_id)
            .finish_non_exhaustive()
    }
}

impl<C: Client> Read for PoolConn<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.client.read(buf)
    }
}

impl<C: Client> Write for PoolConn<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.client.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.client.flush()
    }
}

impl<C: Client> Client for PoolConn<C> {
    fn remote(&self) -> &str {
        self.client.remote()
    }

    // 由连接池负责关闭
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}
