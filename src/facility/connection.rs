//! Agent-side facility client
//!
//! One connection per (agent, facility) pair. The connection is opened lazily
//! on the first request, sends HELLO before anything else, and runs a
//! listener task that turns the server's pushes into calls on the handler the
//! agent supplied. Pushes addressed to other agents and lines outside the
//! vocabulary are dropped on the floor.
//!
//! The server owns the truth about an in-flight visit; the `finished` flag
//! here is only a cache of the last completion event, reset when a new
//! request goes out.

use crate::facility::protocol::{Command, EventToken, FacilityKind, Push};
use crate::types::AgentId;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Callback invoked with every push addressed to the owning agent.
pub type PushHandler = Arc<dyn Fn(&Push) + Send + Sync>;

/// Client end of one (agent, facility) session.
pub struct FacilityConnection {
    kind: FacilityKind,
    addr: SocketAddr,
    agent: AgentId,
    handler: PushHandler,
    finished: Arc<AtomicBool>,
    link: Option<Link>,
}

struct Link {
    writer: OwnedWriteHalf,
    listener: JoinHandle<()>,
}

impl FacilityConnection {
    /// Create a disconnected client. No socket is opened until the first
    /// [`request_break`](Self::request_break).
    pub fn new(kind: FacilityKind, addr: SocketAddr, agent: AgentId, handler: PushHandler) -> Self {
        Self { kind, addr, agent, handler, finished: Arc::new(AtomicBool::new(false)), link: None }
    }

    /// Which facility this connection talks to.
    pub fn kind(&self) -> FacilityKind {
        self.kind
    }

    /// Whether a socket is currently open.
    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Send one access request, connecting and identifying first if needed.
    ///
    /// The caller must not have another request outstanding on this
    /// connection; completion is observed through
    /// [`break_finished`](Self::break_finished).
    pub async fn request_break(&mut self) -> std::io::Result<()> {
        self.ensure_connected().await?;
        self.finished.store(false, Ordering::SeqCst);
        self.send(&Command::Request(self.kind)).await?;
        debug!(agent = %self.agent, facility = %self.kind, "break requested");
        Ok(())
    }

    /// Whether the last request has reached a terminal event
    /// (BREAK_COMPLETE or INTERRUPTED).
    pub fn break_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Close the session: best-effort QUIT, then tear the socket down.
    /// Harmless when already disconnected.
    pub async fn close(&mut self) {
        if let Some(mut link) = self.link.take() {
            let line = format!("{}\n", Command::Quit);
            if let Err(e) = link.writer.write_all(line.as_bytes()).await {
                trace!(agent = %self.agent, facility = %self.kind, error = %e, "QUIT not sent");
            }
            let _ = link.writer.shutdown().await;
            link.listener.abort();
            info!(agent = %self.agent, facility = %self.kind, "session closed");
        }
    }

    async fn ensure_connected(&mut self) -> std::io::Result<()> {
        if self.link.is_some() {
            return Ok(());
        }

        let stream = TcpStream::connect(self.addr).await?;
        let (read_half, writer) = stream.into_split();

        let agent = self.agent.clone();
        let handler = Arc::clone(&self.handler);
        let finished = Arc::clone(&self.finished);
        let kind = self.kind;
        let listener = tokio::spawn(async move {
            let mut lines = BufReader::new(read_half).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let push = match line.parse::<Push>() {
                    Ok(push) => push,
                    Err(e) => {
                        trace!(agent = %agent, facility = %kind, error = %e, "ignoring line");
                        continue;
                    }
                };
                // Only our own updates matter; anything else is noise.
                if push.agent() != &agent {
                    trace!(agent = %agent, addressee = %push.agent(), "ignoring foreign push");
                    continue;
                }
                if let Push::Event { token, .. } = &push {
                    match token {
                        EventToken::BreakComplete | EventToken::Interrupted => {
                            finished.store(true, Ordering::SeqCst);
                        }
                        EventToken::UnknownCommand(cmd) => {
                            warn!(agent = %agent, facility = %kind, command = %cmd,
                                "server rejected command");
                        }
                        _ => {}
                    }
                }
                handler(&push);
            }
            debug!(agent = %agent, facility = %kind, "server connection ended");
        });

        self.link = Some(Link { writer, listener });
        self.send(&Command::Hello(self.agent.clone())).await?;
        info!(agent = %self.agent, facility = %self.kind, addr = %self.addr, "connected");
        Ok(())
    }

    async fn send(&mut self, command: &Command) -> std::io::Result<()> {
        let link = self.link.as_mut().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotConnected, "facility link not open")
        })?;
        let line = format!("{}\n", command);
        match link.writer.write_all(line.as_bytes()).await {
            Ok(()) => Ok(()),
            Err(e) => {
                // Drop the dead link so the next request reconnects.
                if let Some(link) = self.link.take() {
                    link.listener.abort();
                }
                Err(e)
            }
        }
    }
}

impl Drop for FacilityConnection {
    fn drop(&mut self) {
        if let Some(link) = self.link.take() {
            link.listener.abort();
        }
    }
}

impl std::fmt::Debug for FacilityConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacilityConnection")
            .field("kind", &self.kind)
            .field("addr", &self.addr)
            .field("agent", &self.agent)
            .field("connected", &self.link.is_some())
            .finish()
    }
}
