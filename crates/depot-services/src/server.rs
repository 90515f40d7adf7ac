//! Accept loop — admission control and handler spawning.
//!
//! Binding is fatal at startup; everything after that is per-connection.
//! The loop is cancellable: a shutdown broadcast unblocks `accept` via
//! `select!`, and in-flight handlers wind down through their own I/O error
//! paths once their peers disconnect.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use depot_core::wire;

use crate::connection::ConnectionHandler;
use crate::state::ServerState;

pub struct Listener {
    listener: TcpListener,
    state: Arc<ServerState>,
    files_root: PathBuf,
    ack_timeout: Option<Duration>,
    shutdown: broadcast::Receiver<()>,
}

impl Listener {
    /// Bind the listen socket. Failure here aborts startup.
    pub async fn bind(
        addr: &str,
        state: Arc<ServerState>,
        files_root: PathBuf,
        ack_timeout: Option<Duration>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        Ok(Self {
            listener,
            state,
            files_root,
            ack_timeout,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(mut self) -> Result<()> {
        tracing::info!(
            addr = %self.local_addr()?,
            max_clients = self.state.capacity(),
            "listening"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("listener shutting down");
                    return Ok(());
                }

                result = self.listener.accept() => {
                    let (stream, peer) = match result {
                        Ok(r) => r,
                        Err(e) => {
                            tracing::warn!(error = %e, "accept failed");
                            continue;
                        }
                    };

                    match self.state.try_acquire() {
                        Err(_) => {
                            tracing::warn!(peer = %peer, "server full, rejecting connection");
                            // Deliver the rejection off the accept path so a
                            // slow peer cannot stall admission of the next one.
                            tokio::spawn(async move {
                                let mut stream = stream;
                                let _ = stream.write_all(wire::SERVER_FULL.as_bytes()).await;
                                let _ = stream.flush().await;
                            });
                        }
                        Ok(slot) => {
                            tracing::debug!(peer = %peer, slot = slot.number(), "connection accepted");
                            let handler = ConnectionHandler::new(
                                stream,
                                peer,
                                slot,
                                Arc::clone(&self.state),
                                self.files_root.clone(),
                                self.ack_timeout,
                            );
                            tokio::spawn(handler.run());
                        }
                    }
                }
            }
        }
    }
}
