// src/stream.rs

//! Pixel stream transport: a TCP client delivering length-prefixed frames.
//!
//! Wire format: each frame is a `u32` big-endian payload length followed by
//! the payload bytes. The reader thread only decodes frames and forwards them
//! over an mpsc channel; it never touches the pixel buffer, so all buffer
//! mutation stays on the thread that owns the visualizer.
//!
//! A ravelights server does not speak this framing: it publishes pixel
//! frames as Socket.IO `message` events. Talking to one needs a bridge that
//! subscribes there and rewrites each event payload as a length-prefixed
//! frame on this socket.

use anyhow::{Context, Result};
use log::*;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Size of the length prefix.
pub const FRAME_HEADER_BYTES: usize = 4;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Events delivered to the visualizer, in receipt order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Connected(SocketAddr),
    Frame(Vec<u8>),
    /// The connection ended or could not be established.
    Disconnected(String),
}

/// Reads one frame. `Ok(None)` means the peer closed the connection cleanly
/// between frames; EOF inside a frame is an error.
pub fn read_frame<R: Read>(reader: &mut R, max_frame_bytes: usize) -> io::Result<Option<Vec<u8>>> {
    let mut header = [0u8; FRAME_HEADER_BYTES];
    let mut filled = 0;
    while filled < FRAME_HEADER_BYTES {
        match reader.read(&mut header[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "connection closed inside a frame header",
                ))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    let len = u32::from_be_bytes(header) as usize;
    if len > max_frame_bytes {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            format!("frame of {} bytes exceeds limit of {}", len, max_frame_bytes),
        ));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(Some(payload))
}

pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    let len = u32::try_from(payload.len())
        .map_err(|_| io::Error::new(ErrorKind::InvalidInput, "frame longer than u32::MAX"))?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(payload)
}

#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// `host:port` of the frame producer.
    pub addr: String,
    pub max_frame_bytes: usize,
    /// `None` ends the actor after the first disconnect.
    pub reconnect_delay: Option<Duration>,
}

/// Background reader for the pixel stream.
///
/// Dropping the actor stops it: the live socket is shut down, any pending
/// reconnect delay is cut short, and the thread is joined.
pub struct StreamActor {
    thread_handle: Option<JoinHandle<()>>,
    stop_tx: Option<Sender<()>>,
    active: Arc<Mutex<Option<TcpStream>>>,
}

impl StreamActor {
    pub fn spawn(settings: StreamSettings, event_tx: Sender<StreamEvent>) -> Result<Self> {
        let (stop_tx, stop_rx) = std::sync::mpsc::channel();
        let active = Arc::new(Mutex::new(None));
        let thread_active = Arc::clone(&active);

        let thread_handle = thread::Builder::new()
            .name("pixel-stream".to_string())
            .spawn(move || Self::actor_thread_main(settings, event_tx, stop_rx, thread_active))
            .context("Failed to spawn pixel stream thread")?;

        info!("StreamActor thread spawned");

        Ok(Self {
            thread_handle: Some(thread_handle),
            stop_tx: Some(stop_tx),
            active,
        })
    }

    fn actor_thread_main(
        settings: StreamSettings,
        event_tx: Sender<StreamEvent>,
        stop_rx: Receiver<()>,
        active: Arc<Mutex<Option<TcpStream>>>,
    ) {
        loop {
            let reason = match connect(&settings.addr) {
                Ok(stream) => {
                    let peer = stream.peer_addr().ok();
                    info!("StreamActor: Connected to {}", settings.addr);
                    if let Ok(clone) = stream.try_clone() {
                        if let Ok(mut slot) = active.lock() {
                            *slot = Some(clone);
                        }
                    }
                    // A stop that raced the registration above would miss the socket.
                    if let Err(std::sync::mpsc::TryRecvError::Disconnected) = stop_rx.try_recv() {
                        return;
                    }
                    if let Some(peer) = peer {
                        if event_tx.send(StreamEvent::Connected(peer)).is_err() {
                            return;
                        }
                    }

                    let reason = match Self::pump_frames(stream, &settings, &event_tx) {
                        Some(reason) => reason,
                        None => {
                            debug!("StreamActor: Receiver gone, exiting");
                            return;
                        }
                    };
                    if let Ok(mut slot) = active.lock() {
                        *slot = None;
                    }
                    reason
                }
                Err(e) => format!("{:#}", e),
            };

            warn!("StreamActor: Stream {} unavailable: {}", settings.addr, reason);
            if event_tx.send(StreamEvent::Disconnected(reason)).is_err() {
                return;
            }

            let Some(delay) = settings.reconnect_delay else {
                info!("StreamActor: Reconnect disabled, exiting");
                return;
            };
            match stop_rx.recv_timeout(delay) {
                Err(RecvTimeoutError::Timeout) => {
                    debug!("StreamActor: Reconnecting to {}", settings.addr);
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    info!("StreamActor: Stop requested, exiting");
                    return;
                }
            }
        }
    }

    /// Forwards frames until the connection ends. Returns the reason it
    /// ended, or `None` when the receiving side has hung up.
    fn pump_frames(
        mut stream: TcpStream,
        settings: &StreamSettings,
        event_tx: &Sender<StreamEvent>,
    ) -> Option<String> {
        loop {
            match read_frame(&mut stream, settings.max_frame_bytes) {
                Ok(Some(frame)) => {
                    trace!("StreamActor: Received frame of {} bytes", frame.len());
                    if event_tx.send(StreamEvent::Frame(frame)).is_err() {
                        return None;
                    }
                }
                Ok(None) => return Some("connection closed by peer".to_string()),
                Err(e) => return Some(format!("read failed: {}", e)),
            }
        }
    }
}

fn connect(addr: &str) -> Result<TcpStream> {
    let candidates: Vec<SocketAddr> = addr
        .to_socket_addrs()
        .with_context(|| format!("Failed to resolve {}", addr))?
        .collect();

    let mut last_error = None;
    for candidate in candidates {
        match TcpStream::connect_timeout(&candidate, CONNECT_TIMEOUT) {
            Ok(stream) => {
                stream.set_nodelay(true).ok();
                return Ok(stream);
            }
            Err(e) => last_error = Some(e),
        }
    }
    match last_error {
        Some(e) => Err(e).with_context(|| format!("Failed to connect to {}", addr)),
        None => Err(anyhow::anyhow!("{} resolved to no addresses", addr)),
    }
}

impl Drop for StreamActor {
    fn drop(&mut self) {
        debug!("StreamActor dropped");
        self.stop_tx.take();
        if let Ok(mut slot) = self.active.lock() {
            if let Some(stream) = slot.take() {
                let _ = stream.shutdown(Shutdown::Both);
            }
        }
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                error!("StreamActor thread panicked: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests;
