// Copyright (c) 2025, vistone
// All rights reserved.

use crate::connection::PoolConn;

/// Bucket 单个地址的空闲连接栈
///
/// 后进先出：最近归还的连接最先被复用。容量为软上限，只在 `try_push`
/// 时检查。
#[derive(Debug)]
pub struct Bucket<C> {
    conns: Vec<PoolConn<C>>,
    capacity: usize,
}

impl<C> Bucket<C> {
    pub fn new(capacity: usize) -> Self {
        Self {
            conns: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.conns.len() >= self.capacity
    }

    /// pop 取出栈顶连接
    pub fn pop(&mut self) -> Option<PoolConn<C>> {
        self.conns.pop()
    }

    /// try_push 容量未满时压入栈顶，否则原样返回该连接
    pub fn try_push(&mut self, conn: PoolConn<C>) -> std::result::Result<(), PoolConn<C>> {
        if self.is_full() {
            return Err(conn);
        }
        self.conns.push(conn);
        Ok(())
    }

    /// requeue 把连接放回栈底，不检查容量
    pub fn requeue(&mut self, conns: Vec<PoolConn<C>>) {
        if conns.is_empty() {
            return;
        }
        self.conns.splice(0..0, conns);
    }

    /// drain 取出全部连接
    pub fn drain(&mut self) -> Vec<PoolConn<C>> {
        std::mem::take(&mut self.conns)
    }
}
