//! Facility TCP server
//!
//! One listener per facility instance. Every accepted connection gets a
//! reader task (this module) and a writer task draining the push channel, so
//! the access pipeline can stream state updates while the reader stays parked
//! on the socket. Protocol errors are answered with an `EVENT` and never
//! tear the connection down; a dropped connection aborts any in-flight
//! request and the room slot is reclaimed through the gate guard.

use crate::facility::facility::{Facility, PushSender};
use crate::facility::protocol::{Command, EventToken, ProtocolError, Push};
use crate::types::AgentId;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// TCP front end for one [`Facility`].
#[derive(Debug)]
pub struct FacilityServer {
    facility: Arc<Facility>,
    shutdown: CancellationToken,
}

impl FacilityServer {
    /// Create a server fronting `facility`. `shutdown` stops the accept loop
    /// and aborts all in-flight requests.
    pub fn new(facility: Arc<Facility>, shutdown: CancellationToken) -> Self {
        Self { facility, shutdown }
    }

    /// The facility behind this server.
    pub fn facility(&self) -> &Arc<Facility> {
        &self.facility
    }

    /// Accept connections until shut down. The caller binds the listener so
    /// it can learn the local address first (ports may be ephemeral).
    pub async fn serve(self, listener: TcpListener) {
        let local = listener.local_addr().ok();
        info!(facility = %self.facility.kind(), addr = ?local, "facility server listening");

        loop {
            let stream = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(facility = %self.facility.kind(), %peer, "client connected");
                        stream
                    }
                    Err(e) => {
                        warn!(facility = %self.facility.kind(), error = %e, "accept failed");
                        continue;
                    }
                },
            };

            let facility = Arc::clone(&self.facility);
            let session_cancel = self.shutdown.child_token();
            tokio::spawn(async move {
                handle_connection(facility, stream, session_cancel).await;
            });
        }

        // Unblock anyone still queued on the room gate.
        self.facility.close();
        info!(facility = %self.facility.kind(), "facility server stopped");
    }
}

/// Per-connection session: the identity registered by HELLO plus the gate
/// that keeps one agent's requests strictly sequential.
struct Session {
    agent: Option<AgentId>,
    serial: Arc<Semaphore>,
}

impl Session {
    fn addressee(&self) -> AgentId {
        self.agent.clone().unwrap_or_else(AgentId::unknown)
    }
}

async fn handle_connection(facility: Arc<Facility>, stream: TcpStream, cancel: CancellationToken) {
    let (read_half, write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_pushes(write_half, rx));

    let mut session = Session { agent: None, serial: Arc::new(Semaphore::new(1)) };

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => line,
                // EOF or a dropped socket both end the session the same way.
                Ok(None) => break,
                Err(e) => {
                    debug!(facility = %facility.kind(), error = %e, "connection read error");
                    break;
                }
            },
        };

        if line.trim().is_empty() {
            continue;
        }
        if !handle_line(&facility, &mut session, &line, &tx, &cancel) {
            break;
        }
    }

    // Abort any in-flight request; the gate guard inside `attend` releases
    // the room slot even though the peer is gone.
    cancel.cancel();
    drop(tx);
    let _ = writer.await;
    debug!(facility = %facility.kind(), agent = %session.addressee(), "client disconnected");
}

/// Handle one parsed line. Returns `false` once the session should close.
fn handle_line(
    facility: &Arc<Facility>,
    session: &mut Session,
    line: &str,
    tx: &PushSender,
    cancel: &CancellationToken,
) -> bool {
    match line.parse::<Command>() {
        Ok(Command::Hello(agent)) => {
            info!(facility = %facility.kind(), agent = %agent, "agent identified");
            session.agent = Some(agent.clone());
            let _ = tx.send(Push::Event { agent, token: EventToken::HelloOk });
            true
        }
        Ok(Command::Request(kind)) if kind == facility.kind() => {
            let Some(agent) = session.agent.clone() else {
                warn!(facility = %facility.kind(), "request before HELLO ignored");
                let _ = tx.send(Push::Event {
                    agent: AgentId::unknown(),
                    token: EventToken::NotIdentified,
                });
                return true;
            };

            let facility = Arc::clone(facility);
            let serial = Arc::clone(&session.serial);
            let tx = tx.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                // One agent's requests run strictly one at a time; extra
                // requests queue here before they ever touch the room gate.
                let permit = tokio::select! {
                    _ = cancel.cancelled() => return,
                    permit = serial.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return,
                    },
                };
                facility.attend(&agent, &tx, &cancel).await;
                drop(permit);
            });
            true
        }
        Ok(Command::Request(kind)) => {
            // Wrong room: this listener does not host that facility.
            let _ = tx.send(Push::Event {
                agent: session.addressee(),
                token: EventToken::UnknownCommand(kind.request_keyword().to_string()),
            });
            true
        }
        Ok(Command::Quit) => {
            let _ = tx.send(Push::Event { agent: session.addressee(), token: EventToken::Bye });
            false
        }
        Err(ProtocolError::EmptyLine) => true,
        Err(ProtocolError::UnknownCommand(cmd)) => {
            debug!(facility = %facility.kind(), command = %cmd, "unknown command");
            let _ = tx.send(Push::Event {
                agent: session.addressee(),
                token: EventToken::UnknownCommand(cmd),
            });
            true
        }
        Err(ProtocolError::Malformed { keyword, reason }) => {
            debug!(facility = %facility.kind(), keyword, %reason, "malformed command");
            let _ = tx.send(Push::Event {
                agent: session.addressee(),
                token: EventToken::UnknownCommand(keyword.to_string()),
            });
            true
        }
    }
}

async fn write_pushes(mut write_half: OwnedWriteHalf, mut rx: mpsc::UnboundedReceiver<Push>) {
    while let Some(push) = rx.recv().await {
        let line = format!("{}\n", push);
        if write_half.write_all(line.as_bytes()).await.is_err() {
            // Peer is gone; drain and drop remaining pushes.
            break;
        }
    }
    let _ = write_half.shutdown().await;
}
