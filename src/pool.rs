// Copyright (c) 2025, vistone
// All rights reserved.

use crate::bucket::Bucket;
use crate::config::Config;
use crate::connection::PoolConn;
use crate::errors::{PoolError, ReleaseError, ReleaseResult, Result};
use crate::stats::{Stats, StatsCollector};
use crate::transport::{Client, DialOptions, Dialer};
use crossbeam::sync::ShardedLock;
use log::{debug, trace, warn};
use std::collections::HashMap;
use std::error::Error;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

static POOL_ID_GENERATOR: AtomicU64 = AtomicU64::new(1);

type SharedBucket<C> = Arc<Mutex<Bucket<C>>>;

/// Pool 按目标地址缓存连接的连接池
///
/// 每个地址一个后进先出的空闲栈。地址表由读多写少的 `ShardedLock`
/// 保护，每个栈各自持有一把 `Mutex`，锁只在单次入栈、出栈或清空时
/// 持有；拨号与关闭连接都在锁外进行，慢速网络操作不会阻塞其他调用。
/// 所有修改都直接作用在共享的栈上，同一地址的并发获取与归还不会
/// 丢失或重复发放连接。
pub struct Pool<D: Dialer> {
    id: u64,
    config: Config,
    dialer: D,
    buckets: ShardedLock<HashMap<String, SharedBucket<D::Conn>>>,
    closed: AtomicBool,
    stats_collector: Option<StatsCollector>,
}

impl<D: Dialer> Pool<D> {
    /// new 创建新的连接池
    pub fn new(config: Config, dialer: D) -> Result<Self> {
        config.validate()?;

        let stats_collector = if config.enable_stats {
            Some(StatsCollector::new())
        } else {
            None
        };

        Ok(Self {
            id: POOL_ID_GENERATOR.fetch_add(1, Ordering::Relaxed),
            config,
            dialer,
            buckets: ShardedLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
            stats_collector,
        })
    }

    /// get 获取到 `addr` 的连接，使用默认拨号选项
    pub fn get(&self, addr: &str) -> Result<PoolConn<D::Conn>> {
        self.get_with_options(addr, &DialOptions::default())
    }

    /// get_with_options 获取到 `addr` 的连接
    ///
    /// 优先复用最近归还且未过期的连接；过期的连接会先被关闭丢弃。
    /// 没有可用连接时使用 `opts` 拨号，新连接不会进入空闲栈，直到
    /// 调用方通过 [`Pool::release`] 归还。
    ///
    /// 淘汰过期连接时关闭失败会中止本次调用并返回该错误。
    pub fn get_with_options(&self, addr: &str, opts: &DialOptions) -> Result<PoolConn<D::Conn>> {
        if self.is_closed() {
            return Err(PoolError::PoolClosed);
        }

        if let Some(stats) = &self.stats_collector {
            stats.increment_total_get_requests();
        }

        if let Some(bucket) = self.bucket(addr) {
            let taken = self.take_fresh(addr, &bucket);
            drop(bucket);
            if !matches!(taken, Ok(Some(_))) {
                self.prune(addr);
            }
            match taken {
                Ok(Some(conn)) => {
                    debug!("复用连接 {} -> {}", conn.id(), addr);
                    if let Some(stats) = &self.stats_collector {
                        stats.record_reuse();
                    }
                    return Ok(conn);
                }
                Ok(None) => {}
                Err(e) => {
                    if let Some(stats) = &self.stats_collector {
                        stats.increment_failed_gets();
                    }
                    return Err(e);
                }
            }
        }

        match self.dialer.dial(addr, opts) {
            Ok(client) => {
                let conn = PoolConn::new(client, self.id);
                debug!("新建连接 {} -> {}", conn.id(), addr);
                if let Some(stats) = &self.stats_collector {
                    stats.record_dial();
                }
                Ok(conn)
            }
            Err(e) => {
                debug!("拨号 {} 失败: {}", addr, e);
                if let Some(stats) = &self.stats_collector {
                    stats.record_dial_error();
                    stats.increment_failed_gets();
                }
                Err(PoolError::DialFailed(e))
            }
        }
    }

    /// release 归还连接
    ///
    /// `call_err` 为本次使用中遇到的错误：有错误时连接一律关闭，不再复用。
    /// 不是本连接池发放的连接返回 [`ReleaseError::UnknownConnectionType`]，
    /// 连接原样交还给调用方且不修改任何空闲栈。空闲栈已满时连接被关闭。
    pub fn release(
        &self,
        conn: PoolConn<D::Conn>,
        call_err: Option<&dyn Error>,
    ) -> ReleaseResult<D::Conn> {
        if conn.pool_id() != self.id {
            warn!("连接 {} 不属于此连接池", conn.id());
            return Err(ReleaseError::UnknownConnectionType(conn));
        }

        if let Some(err) = call_err {
            debug!("连接 {} 调用出错，丢弃: {}", conn.id(), err);
            if let Some(stats) = &self.stats_collector {
                stats.record_error_discard();
                stats.record_returned();
            }
            return self.close_conn(conn).map_err(ReleaseError::Pool);
        }

        if self.is_closed() {
            if let Some(stats) = &self.stats_collector {
                stats.record_returned();
            }
            return self.close_conn(conn).map_err(ReleaseError::Pool);
        }

        let bucket = self.bucket_or_insert(conn.remote());
        let pushed = lock(&bucket).try_push(conn);
        match pushed {
            Ok(()) => {
                if let Some(stats) = &self.stats_collector {
                    stats.record_pooled();
                }
                // close() 可能在入栈前已经清空了这个栈
                if self.is_closed() {
                    let swept = self.close_bucket(&bucket);
                    drop(bucket);
                    self.prune_all();
                    return swept.map_err(ReleaseError::Pool);
                }
                Ok(())
            }
            Err(conn) => {
                debug!(
                    "{} 空闲连接已达上限 {}，关闭连接 {}",
                    conn.remote(),
                    self.config.size,
                    conn.id()
                );
                if let Some(stats) = &self.stats_collector {
                    stats.record_capacity_discard();
                    stats.record_returned();
                }
                self.close_conn(conn).map_err(ReleaseError::Pool)
            }
        }
    }

    /// close 关闭连接池
    ///
    /// 清空所有地址的空闲栈并逐个关闭连接。多个连接关闭失败时只返回
    /// 最后一个错误，每个失败都会以 `warn` 级别记录。重复调用直接返回。
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let buckets = std::mem::take(&mut *self.write_buckets());

        let mut conns = Vec::new();
        for (addr, bucket) in buckets {
            let drained = lock(&bucket).drain();
            debug!("关闭连接池: {} 有 {} 个空闲连接", addr, drained.len());
            conns.extend(drained);
        }

        if let Some(stats) = &self.stats_collector {
            stats.record_idle_removed(conns.len() as i64);
        }

        let mut last_err = None;
        for conn in conns {
            if let Err(e) = self.close_conn(conn) {
                last_err = Some(e);
            }
        }

        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// is_closed 连接池是否已关闭
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// idle_count 指定地址当前的空闲连接数
    pub fn idle_count(&self, addr: &str) -> usize {
        let Some(bucket) = self.bucket(addr) else {
            return 0;
        };
        let len = lock(&bucket).len();
        len
    }

    /// total_idle 所有地址的空闲连接总数
    pub fn total_idle(&self) -> usize {
        let buckets: Vec<_> = self.read_buckets().values().cloned().collect();
        buckets.iter().map(|bucket| lock(bucket).len()).sum()
    }

    /// stats 获取统计信息
    pub fn stats(&self) -> Stats {
        match &self.stats_collector {
            Some(stats) => stats.get_stats(),
            None => Stats::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dialer(&self) -> &D {
        &self.dialer
    }

    // 私有辅助方法

    /// 从栈顶开始找第一个地址匹配且未过期的连接
    ///
    /// 地址不匹配的连接先放在一边，扫描结束后放回栈底，每个连接在一次
    /// 扫描中最多检查一次。
    fn take_fresh(
        &self,
        addr: &str,
        bucket: &Mutex<Bucket<D::Conn>>,
    ) -> Result<Option<PoolConn<D::Conn>>> {
        let mut misplaced = Vec::new();

        let found = loop {
            let popped = lock(bucket).pop();
            let Some(conn) = popped else {
                break Ok(None);
            };
            if let Some(stats) = &self.stats_collector {
                stats.record_idle_removed(1);
            }

            if conn.remote() != addr {
                trace!("连接 {} 的远端 {} 与 {} 不符，稍后放回", conn.id(), conn.remote(), addr);
                misplaced.push(conn);
                continue;
            }

            if conn.is_expired(self.config.ttl) {
                debug!("连接 {} 已存活 {:?}，超过TTL，淘汰", conn.id(), conn.age());
                if let Some(stats) = &self.stats_collector {
                    stats.record_expired();
                }
                if let Err(e) = self.close_conn(conn) {
                    break Err(e);
                }
                continue;
            }

            break Ok(Some(conn));
        };

        if !misplaced.is_empty() {
            if let Some(stats) = &self.stats_collector {
                stats.record_idle_removed(-(misplaced.len() as i64));
            }
            lock(bucket).requeue(misplaced);
            if self.is_closed() {
                // 已取到的连接照常交给调用方，由其归还时关闭
                let swept = self.close_bucket(bucket);
                if matches!(found, Ok(None)) {
                    swept?;
                }
            }
        }

        found
    }

    fn close_conn(&self, mut conn: PoolConn<D::Conn>) -> Result<()> {
        let result = conn.close_inner();
        if let Some(stats) = &self.stats_collector {
            stats.record_close(result.is_ok());
        }
        result.map_err(|e| {
            warn!("关闭连接 {} -> {} 失败: {}", conn.id(), conn.remote(), e);
            PoolError::CloseFailed(e)
        })
    }

    /// 清空并关闭单个栈，用于连接池关闭后才入栈的连接
    fn close_bucket(&self, bucket: &Mutex<Bucket<D::Conn>>) -> Result<()> {
        let drained = lock(bucket).drain();
        if let Some(stats) = &self.stats_collector {
            stats.record_idle_removed(drained.len() as i64);
        }
        let mut last_err = None;
        for conn in drained {
            if let Err(e) = self.close_conn(conn) {
                last_err = Some(e);
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// 移除 `addr` 的空栈
    ///
    /// 只有地址表是栈的唯一持有者时才移除：持有写锁期间没有人能再取得
    /// 新的引用，已经取得引用的调用方仍会看到这个栈，不会把连接放进
    /// 已脱离地址表的栈里。
    fn prune(&self, addr: &str) {
        let mut buckets = self.write_buckets();
        let removable = buckets
            .get(addr)
            .is_some_and(|bucket| Arc::strong_count(bucket) == 1 && lock(bucket).is_empty());
        if removable {
            buckets.remove(addr);
        }
    }

    /// 移除所有无人引用的空栈，用于连接池关闭后的清扫
    fn prune_all(&self) {
        self.write_buckets()
            .retain(|_, bucket| Arc::strong_count(bucket) > 1 || !lock(&**bucket).is_empty());
    }

    fn bucket(&self, addr: &str) -> Option<SharedBucket<D::Conn>> {
        self.read_buckets().get(addr).cloned()
    }

    fn bucket_or_insert(&self, addr: &str) -> SharedBucket<D::Conn> {
        if let Some(bucket) = self.bucket(addr) {
            return bucket;
        }
        let size = self.config.size;
        self.write_buckets()
            .entry(addr.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Bucket::new(size))))
            .clone()
    }

    fn read_buckets(
        &self,
    ) -> crossbeam::sync::ShardedLockReadGuard<'_, HashMap<String, SharedBucket<D::Conn>>> {
        self.buckets.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_buckets(
        &self,
    ) -> crossbeam::sync::ShardedLockWriteGuard<'_, HashMap<String, SharedBucket<D::Conn>>> {
        self.buckets.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// 栈内操作不会在中途 panic，中毒的锁可以直接继续使用
fn lock<C>(bucket: &Mutex<Bucket<C>>) -> MutexGuard<'_, Bucket<C>> {
    bucket.lock().unwrap_or_else(PoisonError::into_inner)
}
