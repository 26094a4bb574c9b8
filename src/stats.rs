// Copyright (c) 2025, vistone
// All rights reserved.

use std::sync::atomic::{AtomicI64, Ordering};

/// Stats 连接池统计信息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    /// TotalConnectionsCreated 累计拨号创建的连接数
    pub total_connections_created: i64,
    /// TotalConnectionsClosed 累计关闭的底层连接数
    pub total_connections_closed: i64,
    /// TotalConnectionsReused 累计从空闲栈中复用的次数
    pub total_connections_reused: i64,

    /// CurrentIdleConnections 当前空闲连接数（所有地址之和）
    pub current_idle_connections: i64,
    /// CurrentActiveConnections 当前被调用方持有的连接数
    pub current_active_connections: i64,

    /// TotalGetRequests 累计获取连接请求数
    pub total_get_requests: i64,
    /// FailedGets 失败获取连接数
    pub failed_gets: i64,

    /// ExpiredEvictions 因超过TTL被淘汰的连接数
    pub expired_evictions: i64,
    /// CapacityDiscards 因空闲栈已满被丢弃的连接数
    pub capacity_discards: i64,
    /// ErrorDiscards 因调用出错被丢弃的连接数
    pub error_discards: i64,

    /// DialErrors 拨号失败次数
    pub dial_errors: i64,
    /// CloseErrors 关闭底层连接失败次数
    pub close_errors: i64,

    /// AverageReuseCount 平均每个连接的复用次数
    pub average_reuse_count: f64,
}

/// StatsCollector 统计收集器
#[derive(Debug, Default)]
pub struct StatsCollector {
    total_connections_created: AtomicI64,
    total_connections_closed: AtomicI64,
    total_connections_reused: AtomicI64,
    current_idle_connections: AtomicI64,
    current_active_connections: AtomicI64,
    total_get_requests: AtomicI64,
    failed_gets: AtomicI64,
    expired_evictions: AtomicI64,
    capacity_discards: AtomicI64,
    error_discards: AtomicI64,
    dial_errors: AtomicI64,
    close_errors: AtomicI64,
}

impl StatsCollector {
    /// new 创建统计收集器
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_total_get_requests(&self) {
        self.total_get_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed_gets(&self) {
        self.failed_gets.fetch_add(1, Ordering::Relaxed);
    }

    /// record_dial 记录一次成功拨号，新连接直接交给调用方
    pub fn record_dial(&self) {
        self.total_connections_created
            .fetch_add(1, Ordering::Relaxed);
        self.current_active_connections
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dial_error(&self) {
        self.dial_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// record_reuse 记录一次从空闲栈借出
    pub fn record_reuse(&self) {
        self.total_connections_reused
            .fetch_add(1, Ordering::Relaxed);
        self.current_active_connections
            .fetch_add(1, Ordering::Relaxed);
    }

    /// record_pooled 记录一次归还入栈
    pub fn record_pooled(&self) {
        self.current_idle_connections
            .fetch_add(1, Ordering::Relaxed);
        self.current_active_connections
            .fetch_sub(1, Ordering::Relaxed);
    }

    /// record_idle_removed 空闲栈中被移除（借出、淘汰或关闭池）的连接数
    pub fn record_idle_removed(&self, count: i64) {
        self.current_idle_connections
            .fetch_sub(count, Ordering::Relaxed);
    }

    /// record_returned 被调用方归还但没有入栈的连接
    pub fn record_returned(&self) {
        self.current_active_connections
            .fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_expired(&self) {
        self.expired_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_capacity_discard(&self) {
        self.capacity_discards.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error_discard(&self) {
        self.error_discards.fetch_add(1, Ordering::Relaxed);
    }

    /// record_close 记录一次底层关闭，失败也算作已关闭
    pub fn record_close(&self, ok: bool) {
        self.total_connections_closed
            .fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.close_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// get_stats 获取当前统计信息快照
    pub fn get_stats(&self) -> Stats {
        let total_created = self.total_connections_created.load(Ordering::Relaxed);
        let total_reused = self.total_connections_reused.load(Ordering::Relaxed);
        let average_reuse_count = if total_created > 0 {
            total_reused as f64 / total_created as f64
        } else {
            0.0
        };

        Stats {
            total_connections_created: total_created,
            total_connections_closed: self.total_connections_closed.load(Ordering::Relaxed),
            total_connections_reused: total_reused,
            current_idle_connections: self.current_idle_connections.load(Ordering::Relaxed),
            current_active_connections: self
                .current_active_connections
                .load(Ordering::Relaxed),
            total_get_requests: self.total_get_requests.load(Ordering::Relaxed),
            failed_gets: self.failed_gets.load(Ordering::Relaxed),
            expired_evictions: self.expired_evictions.load(Ordering::Relaxed),
            capacity_discards: self.capacity_discards.load(Ordering::Relaxed),
            error_discards: self.error_discards.load(Ordering::Relaxed),
            dial_errors: self.dial_errors.load(Ordering::Relaxed),
            close_errors: self.close_errors.load(Ordering::Relaxed),
            average_reuse_count,
        }
    }
}
