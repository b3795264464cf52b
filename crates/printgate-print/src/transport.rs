// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raw TCP transport (JetDirect-style, port 9100).
//
// The engine only needs four capabilities from a transport: dial, write,
// read and close. They are traits so the session can be driven by the
// scripted transport in `mock` as well as by a real socket. Timeouts are
// applied by the callers, not here.

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// Default raw TCP printer port.
pub const RAW_PORT: u16 = 9100;

/// An open byte stream to a printer.
#[async_trait]
pub trait PrinterLink: Send {
    /// Write all of `data` and flush it to the device.
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read whatever the device has sent, up to `buf.len()` bytes.
    /// `Ok(0)` means the device closed the stream.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Shut the stream down.
    async fn close(&mut self) -> io::Result<()>;
}

/// Opens links to printers.
#[async_trait]
pub trait Dialer: Send + Sync {
    type Link: PrinterLink + 'static;

    /// Open a link to `address` (`host:port`).
    async fn dial(&self, address: &str) -> io::Result<Self::Link>;
}

/// Dials printers over plain TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

#[async_trait]
impl Dialer for TcpDialer {
    type Link = TcpLink;

    async fn dial(&self, address: &str) -> io::Result<TcpLink> {
        let stream = TcpStream::connect(address).await?;
        // Status queries are 3 bytes; don't let Nagle hold them back.
        stream.set_nodelay(true)?;
        debug!(address, peer = ?stream.peer_addr().ok(), "tcp connected");
        Ok(TcpLink { stream })
    }
}

/// A TCP connection to a printer.
#[derive(Debug)]
pub struct TcpLink {
    stream: TcpStream,
}

#[async_trait]
impl PrinterLink for TcpLink {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data).await?;
        self.stream.flush().await
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf).await
    }

    async fn close(&mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }
}
