// Copyright (c) 2025, vistone
// All rights reserved.

// 测试用拨号器 - 记录拨号次数和每个连接的关闭次数，可注入拨号/关闭失败

#![allow(dead_code)]

use addrpool::{Client, DialOptions, Dialer};
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Gate 阻塞拨号或关闭，直到被打开
#[derive(Default)]
pub struct Gate {
    shut: AtomicBool,
    waiting: AtomicUsize,
    passed: AtomicUsize,
}

impl Gate {
    /// shut 新建一个关闭状态的闸门
    pub fn shut() -> Arc<Self> {
        let gate = Self::default();
        gate.shut.store(true, Ordering::SeqCst);
        Arc::new(gate)
    }

    pub fn open(&self) {
        self.shut.store(false, Ordering::SeqCst);
    }

    /// waiting 当前被挡住的调用数
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// passed 已通过闸门的调用数
    pub fn passed(&self) -> usize {
        self.passed.load(Ordering::SeqCst)
    }

    /// wait_for_waiters 等到至少 n 个调用被挡住
    pub fn wait_for_waiters(&self, n: usize) {
        while self.waiting() < n {
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn pass(&self) {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        while self.shut.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(1));
        }
        self.waiting.fetch_sub(1, Ordering::SeqCst);
        self.passed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct CloseLog {
    closes: Mutex<HashMap<usize, usize>>,
    fail: AtomicBool,
    gate: Mutex<Option<(String, Arc<Gate>)>>,
}

impl CloseLog {
    /// total 所有连接的关闭次数之和
    pub fn total(&self) -> usize {
        self.closes.lock().unwrap().values().sum()
    }

    /// closed_connections 至少被关闭过一次的连接数
    pub fn closed_connections(&self) -> usize {
        self.closes.lock().unwrap().len()
    }

    /// all_closed_once 每个被关闭的连接都恰好只关闭了一次
    pub fn all_closed_once(&self) -> bool {
        self.closes.lock().unwrap().values().all(|&n| n == 1)
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// set_gate 关闭远端为 `addr` 的连接时先经过闸门
    pub fn set_gate(&self, addr: &str, gate: Arc<Gate>) {
        *self.gate.lock().unwrap() = Some((addr.to_string(), gate));
    }

    fn gate_for(&self, addr: &str) -> Option<Arc<Gate>> {
        match &*self.gate.lock().unwrap() {
            Some((gated, gate)) if gated == addr => Some(gate.clone()),
            _ => None,
        }
    }
}

pub struct MockClient {
    serial: usize,
    remote: String,
    log: Arc<CloseLog>,
}

impl MockClient {
    pub fn serial(&self) -> usize {
        self.serial
    }
}

impl Read for MockClient {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let bytes = self.serial.to_be_bytes();
        let n = bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        Ok(n)
    }
}

impl Write for MockClient {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Client for MockClient {
    fn remote(&self) -> &str {
        &self.remote
    }

    fn close(&mut self) -> io::Result<()> {
        if let Some(gate) = self.log.gate_for(&self.remote) {
            gate.pass();
        }
        *self
            .log
            .closes
            .lock()
            .unwrap()
            .entry(self.serial)
            .or_insert(0) += 1;
        if self.log.fail.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock close failure"));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MockDialer {
    pub log: Arc<CloseLog>,
    dials: AtomicUsize,
    fail_dial: AtomicBool,
    last_opts: Mutex<Option<DialOptions>>,
    gate: Mutex<Option<(String, Arc<Gate>)>>,
}

impl MockDialer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    pub fn set_fail_dial(&self, fail: bool) {
        self.fail_dial.store(fail, Ordering::SeqCst);
    }

    /// set_dial_gate 拨号 `addr` 时先经过闸门
    pub fn set_dial_gate(&self, addr: &str, gate: Arc<Gate>) {
        *self.gate.lock().unwrap() = Some((addr.to_string(), gate));
    }

    pub fn last_opts(&self) -> Option<DialOptions> {
        self.last_opts.lock().unwrap().clone()
    }
}

impl Dialer for MockDialer {
    type Conn = MockClient;

    fn dial(&self, addr: &str, opts: &DialOptions) -> io::Result<MockClient> {
        *self.last_opts.lock().unwrap() = Some(opts.clone());
        let gate = match &*self.gate.lock().unwrap() {
            Some((gated, gate)) if gated == addr => Some(gate.clone()),
            _ => None,
        };
        if let Some(gate) = gate {
            gate.pass();
        }
        if self.fail_dial.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "mock dial failure"));
        }
        let serial = self.dials.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MockClient {
            serial,
            remote: addr.to_string(),
            log: self.log.clone(),
        })
    }
}
