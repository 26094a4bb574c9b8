// Copyright (c) 2025, vistone
// All rights reserved.

use crate::errors::{PoolError, Result};
use std::time::Duration;

/// DEFAULT_POOL_SIZE 每个地址默认保留的空闲连接数
pub const DEFAULT_POOL_SIZE: usize = 100;

/// DEFAULT_POOL_TTL 默认连接存活时间
pub const DEFAULT_POOL_TTL: Duration = Duration::from_secs(60);

/// Config 连接池配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Size 每个地址最多保留的空闲连接数，必须大于0
    pub size: usize,

    /// TTL 连接最大年龄，超过此时间的空闲连接不会再被复用
    /// 为0时任何已归还的连接在下次获取时都视为过期
    pub ttl: Duration,

    /// EnableStats 是否启用统计信息
    pub enable_stats: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

/// default_config 返回默认配置
pub fn default_config() -> Config {
    Config::default_config()
}

impl Config {
    /// default_config 返回默认配置
    pub fn default_config() -> Self {
        Self {
            size: DEFAULT_POOL_SIZE,
            ttl: DEFAULT_POOL_TTL,
            enable_stats: true,
        }
    }

    /// with_size 设置每个地址的容量
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// with_ttl 设置连接存活时间
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// with_stats 开关统计信息
    pub fn with_stats(mut self, enable: bool) -> Self {
        self.enable_stats = enable;
        self
    }

    /// validate 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(PoolError::InvalidConfig("size 必须大于0"));
        }
        Ok(())
    }
}
