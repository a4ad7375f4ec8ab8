//! Non-blocking TCP transport over `std::net`.
//!
//! Turns socket readiness into [`TransportEvent`]s for the connection
//! manager. The same code runs on lwIP sockets on the board and on OS
//! sockets on the host.
//!
//! Written bytes are queued per connection and flushed on every
//! [`Transport::poll`]; whatever the socket accepts is reported back as
//! [`TransportEvent::Sent`].

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};

use log::{debug, warn};

use crate::config::{CHUNK_SIZE, MAX_CONNECTIONS};
use crate::error::{Error, Result, TransportError};
use crate::net::pool::SlotId;
use crate::net::transport::{ConnHandle, Transport, TransportEvent};

/// Per-connection send queue limit: one response head plus two chunks.
pub const SEND_QUEUE_LIMIT: usize = 256 + 2 * CHUNK_SIZE;

struct Stream {
    id: SlotId,
    socket: TcpStream,
    outbound: VecDeque<u8>,
    /// Peer closed its side; reported once.
    eof: bool,
}

pub struct SocketTransport {
    listener: TcpListener,
    next_handle: ConnHandle,
    /// Accepted this poll, waiting for bind or reject.
    pending: Vec<(ConnHandle, TcpStream)>,
    streams: [Option<Stream>; MAX_CONNECTIONS],
}

fn io_code(e: &std::io::Error) -> i32 {
    e.raw_os_error().unwrap_or(-1)
}

impl SocketTransport {
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|e| {
            warn!("HTTP | bind {}: {}", addr, e);
            Error::Transport(TransportError::Bind)
        })?;
        listener.set_nonblocking(true).map_err(|_| Error::Transport(TransportError::Bind))?;
        Ok(Self {
            listener,
            next_handle: 1,
            pending: Vec::new(),
            streams: Default::default(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(|e| Error::Transport(TransportError::Io(io_code(&e))))
    }

    fn stream_mut(&mut self, slot: SlotId) -> Option<&mut Stream> {
        self.streams.get_mut(slot.index())?.as_mut().filter(|s| s.id == slot)
    }

    fn accept_all(&mut self, events: &mut Vec<TransportEvent>) {
        loop {
            match self.listener.accept() {
                Ok((socket, peer)) => {
                    if let Err(e) = socket.set_nonblocking(true) {
                        warn!("HTTP | {}: {}", peer, e);
                        continue;
                    }
                    let _ = socket.set_nodelay(true);
                    let handle = self.next_handle;
                    self.next_handle = self.next_handle.wrapping_add(1);
                    debug!("HTTP | accept {} as handle {}", peer, handle);
                    self.pending.push((handle, socket));
                    events.push(TransportEvent::Accept { handle });
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!("HTTP | accept: {}", e);
                    break;
                }
            }
        }
    }

    /// Flush then read one stream. Returns `false` if the stream failed and
    /// must be dropped.
    fn service(stream: &mut Stream, events: &mut Vec<TransportEvent>) -> bool {
        let slot = stream.id;

        let mut sent = 0;
        while !stream.outbound.is_empty() {
            let (head, _) = stream.outbound.as_slices();
            match stream.socket.write(head) {
                Ok(0) => break,
                Ok(n) => {
                    stream.outbound.drain(..n);
                    sent += n;
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    events.push(TransportEvent::Error { slot, code: io_code(&e) });
                    return false;
                }
            }
        }
        if sent > 0 {
            events.push(TransportEvent::Sent { slot, len: sent });
        }

        if stream.eof {
            return true;
        }
        let mut buf = [0u8; CHUNK_SIZE];
        loop {
            match stream.socket.read(&mut buf) {
                Ok(0) => {
                    stream.eof = true;
                    events.push(TransportEvent::Received { slot, data: Vec::new() });
                    return true;
                }
                Ok(n) => events.push(TransportEvent::Received { slot, data: buf[..n].to_vec() }),
                Err(e) if e.kind() == ErrorKind::WouldBlock => return true,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    events.push(TransportEvent::Error { slot, code: io_code(&e) });
                    return false;
                }
            }
        }
    }
}

impl Transport for SocketTransport {
    fn poll(&mut self, events: &mut Vec<TransportEvent>) {
        for handle in self.pending.drain(..).map(|(h, _)| h) {
            warn!("HTTP | handle {} never bound, dropping", handle);
        }
        self.accept_all(events);

        for entry in &mut self.streams {
            if let Some(stream) = entry {
                if !Self::service(stream, events) {
                    *entry = None;
                }
            }
        }
    }

    fn bind(&mut self, handle: ConnHandle, slot: SlotId) -> core::result::Result<(), TransportError> {
        let pos = self.pending.iter().position(|(h, _)| *h == handle).ok_or(TransportError::UnknownHandle)?;
        let (_, socket) = self.pending.swap_remove(pos);
        let entry = self.streams.get_mut(slot.index()).ok_or(TransportError::UnknownHandle)?;
        *entry = Some(Stream { id: slot, socket, outbound: VecDeque::new(), eof: false });
        Ok(())
    }

    fn write(&mut self, slot: SlotId, data: &[u8]) -> core::result::Result<(), TransportError> {
        let stream = self.stream_mut(slot).ok_or(TransportError::UnknownHandle)?;
        if stream.outbound.len() + data.len() > SEND_QUEUE_LIMIT {
            return Err(TransportError::OutOfMemory);
        }
        stream.outbound.extend(data);
        Ok(())
    }

    fn close(&mut self, slot: SlotId) {
        if let Some(entry) = self.streams.get_mut(slot.index()) {
            if entry.as_ref().is_some_and(|s| s.id == slot) {
                if let Some(stream) = entry.take() {
                    let _ = stream.socket.shutdown(Shutdown::Both);
                }
            }
        }
    }

    fn reject(&mut self, handle: ConnHandle) {
        if let Some(pos) = self.pending.iter().position(|(h, _)| *h == handle) {
            let (_, socket) = self.pending.swap_remove(pos);
            let _ = socket.shutdown(Shutdown::Both);
        }
    }
}
