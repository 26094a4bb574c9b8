// Copyright (c) 2025, vistone
// All rights reserved.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Client 底层传输连接
///
/// 连接池只依赖两个能力：查询远端地址和关闭连接。收发数据通过
/// `Read`/`Write` 完成，由调用方自行使用。
pub trait Client: Read + Write + Send {
    /// remote 远端地址，与拨号时使用的地址一致
    fn remote(&self) -> &str;

    /// close 关闭连接
    fn close(&mut self) -> io::Result<()>;
}

/// Dialer 连接创建器（客户端模式）
pub trait Dialer: Send + Sync {
    /// Conn 拨号得到的连接类型
    type Conn: Client + 'static;

    /// dial 建立到 `addr` 的新连接
    fn dial(&self, addr: &str, opts: &DialOptions) -> io::Result<Self::Conn>;
}

/// DialOptions 拨号选项，原样转交给拨号器
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialOptions {
    /// Timeout 建立连接的超时时间，None 表示使用拨号器的默认行为
    pub timeout: Option<Duration>,

    /// Stream 是否用于流式调用
    pub stream: bool,
}

impl DialOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// with_timeout 设置拨号超时
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// with_stream 标记为流式连接
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

/// TcpDialer 基于 `std::net::TcpStream` 的拨号器
#[derive(Debug, Clone, Default)]
pub struct TcpDialer {
    nodelay: bool,
}

impl TcpDialer {
    pub fn new() -> Self {
        Self::default()
    }

    /// with_nodelay 设置 TCP_NODELAY
    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }
}

impl Dialer for TcpDialer {
    type Conn = TcpClient;

    fn dial(&self, addr: &str, opts: &DialOptions) -> io::Result<TcpClient> {
        let stream = match opts.timeout {
            Some(timeout) => connect_timeout(addr, timeout)?,
            None => TcpStream::connect(addr)?,
        };
        if self.nodelay {
            stream.set_nodelay(true)?;
        }
        Ok(TcpClient {
            stream,
            remote: addr.to_string(),
        })
    }
}

/// 依次尝试解析出的每个地址，返回第一个成功的连接
fn connect_timeout(addr: &str, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    let addrs: Vec<SocketAddr> = addr.to_socket_addrs()?.collect();
    for sock_addr in addrs {
        match TcpStream::connect_timeout(&sock_addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "地址解析结果为空")
    }))
}

/// TcpClient TCP 传输连接
#[derive(Debug)]
pub struct TcpClient {
    stream: TcpStream,
    remote: String,
}

impl TcpClient {
    /// stream 底层 TCP 流
    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }
}

impl Read for TcpClient {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for TcpClient {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl Client for TcpClient {
    fn remote(&self) -> &str {
        &self.remote
    }

    fn close(&mut self) -> io::Result<()> {
        match self.stream.shutdown(Shutdown::Both) {
            // 对端已先行断开
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_dial_options_builder() {
        let opts = DialOptions::new()
            .with_timeout(Duration::from_secs(2))
            .with_stream(true);
        assert_eq!(opts.timeout, Some(Duration::from_secs(2)));
        assert!(opts.stream);
        assert_eq!(DialOptions::default().timeout, None);
    }

    #[test]
    fn test_tcp_dialer_remote_matches_addr() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let dialer = TcpDialer::new().with_nodelay(true);
        let mut conn = dialer
            .dial(&addr, &DialOptions::new().with_timeout(Duration::from_secs(1)))
            .unwrap();
        assert_eq!(conn.remote(), addr);
        assert!(conn.stream().nodelay().unwrap());
        assert!(conn.close().is_ok());
    }

    #[test]
    fn test_tcp_dialer_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let result = TcpDialer::new().dial(&addr, &DialOptions::new());
        assert!(result.is_err());
    }
}
