// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted in-memory transport for tests.
//
// `MockDialer` plays back a script of dial results and hands out links that
// answer status queries from a shared reply queue. Every dial, write and
// close is counted so tests can assert on exactly what touched the "device".

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::probe::STATUS_QUERY;
use crate::transport::{Dialer, PrinterLink};

/// What the next dial does.
#[derive(Debug, Clone, Copy)]
pub enum DialStep {
    Accept,
    Refuse,
    /// Never completes; only the connect timeout ends it.
    Hang,
}

/// What the next read returns.
#[derive(Debug, Clone)]
pub enum Reply {
    Bytes(Vec<u8>),
    /// Never answers; only the probe deadline ends it.
    Silent,
    /// The device closed the stream.
    Eof,
    Error(io::ErrorKind),
}

impl Reply {
    pub fn status(byte: u8) -> Self {
        Self::Bytes(vec![byte])
    }
}

/// Shared instrumentation for a mock dialer and its links.
#[derive(Debug, Clone, Default)]
pub struct Counters {
    dials: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    open: Arc<AtomicUsize>,
    max_open: Arc<AtomicUsize>,
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl Counters {
    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    /// Calls to `close`, i.e. connection releases.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Highest number of links open at the same time.
    pub fn max_open(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().expect("mock lock poisoned").clone()
    }

    pub fn status_queries(&self) -> usize {
        self.writes()
            .iter()
            .filter(|w| w.as_slice() == STATUS_QUERY)
            .count()
    }

    /// Writes other than status queries.
    pub fn payload_writes(&self) -> Vec<Vec<u8>> {
        self.writes()
            .into_iter()
            .filter(|w| w.as_slice() != STATUS_QUERY)
            .collect()
    }

    fn link_opened(&self) {
        let now = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_open.fetch_max(now, Ordering::SeqCst);
    }

    fn link_gone(&self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Scripted dialer. Dials accept once the script runs out; reads fall back
/// to `default_reply` once the reply queue is empty.
pub struct MockDialer {
    steps: Mutex<VecDeque<DialStep>>,
    replies: Arc<Mutex<VecDeque<Reply>>>,
    default_reply: Reply,
    read_delay: Duration,
    payload_write_error: Option<io::ErrorKind>,
    counters: Counters,
}

impl Default for MockDialer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDialer {
    pub fn new() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            replies: Arc::new(Mutex::new(VecDeque::new())),
            default_reply: Reply::Silent,
            read_delay: Duration::ZERO,
            payload_write_error: None,
            counters: Counters::default(),
        }
    }

    /// A device that is always reachable and always ready.
    pub fn always_ready() -> Self {
        Self::new().default_reply(Reply::status(0x16))
    }

    /// Refuse the next `n` dials.
    pub fn refuse(self, n: usize) -> Self {
        self.script(std::iter::repeat_n(DialStep::Refuse, n))
    }

    pub fn script(self, steps: impl IntoIterator<Item = DialStep>) -> Self {
        self.steps.lock().expect("mock lock poisoned").extend(steps);
        self
    }

    /// Queue replies for successive status reads.
    pub fn replies(self, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.replies.lock().expect("mock lock poisoned").extend(replies);
        self
    }

    pub fn default_reply(mut self, reply: Reply) -> Self {
        self.default_reply = reply;
        self
    }

    /// Delay every read by `delay` before answering.
    pub fn read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    /// Fail any write that is not a status query with a broken pipe.
    pub fn fail_payload_write(self) -> Self {
        self.fail_payload_write_with(io::ErrorKind::BrokenPipe)
    }

    /// Fail any write that is not a status query with `kind`.
    pub fn fail_payload_write_with(mut self, kind: io::ErrorKind) -> Self {
        self.payload_write_error = Some(kind);
        self
    }

    pub fn counters(&self) -> Counters {
        self.counters.clone()
    }
}

#[async_trait]
impl Dialer for MockDialer {
    type Link = MockLink;

    async fn dial(&self, _address: &str) -> io::Result<MockLink> {
        self.counters.dials.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .expect("mock lock poisoned")
            .pop_front()
            .unwrap_or(DialStep::Accept);

        match step {
            DialStep::Accept => {
                self.counters.link_opened();
                Ok(MockLink {
                    replies: self.replies.clone(),
                    default_reply: self.default_reply.clone(),
                    read_delay: self.read_delay,
                    payload_write_error: self.payload_write_error,
                    counters: self.counters.clone(),
                    closed: false,
                })
            }
            DialStep::Refuse => Err(io::ErrorKind::ConnectionRefused.into()),
            DialStep::Hang => std::future::pending().await,
        }
    }
}

/// A link handed out by [`MockDialer`].
pub struct MockLink {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    default_reply: Reply,
    read_delay: Duration,
    payload_write_error: Option<io::ErrorKind>,
    counters: Counters,
    closed: bool,
}

#[async_trait]
impl PrinterLink for MockLink {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.counters
            .writes
            .lock()
            .expect("mock lock poisoned")
            .push(data.to_vec());
        match self.payload_write_error {
            Some(kind) if data != STATUS_QUERY => Err(kind.into()),
            _ => Ok(()),
        }
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }
        let reply = self
            .replies
            .lock()
            .expect("mock lock poisoned")
            .pop_front()
            .unwrap_or_else(|| self.default_reply.clone());

        match reply {
            Reply::Bytes(bytes) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            Reply::Silent => std::future::pending().await,
            Reply::Eof => Ok(0),
            Reply::Error(kind) => Err(kind.into()),
        }
    }

    async fn close(&mut self) -> io::Result<()> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        if !self.closed {
            self.closed = true;
            self.counters.link_gone();
        }
        Ok(())
    }
}

impl Drop for MockLink {
    fn drop(&mut self) {
        if !self.closed {
            self.counters.link_gone();
        }
    }
}
