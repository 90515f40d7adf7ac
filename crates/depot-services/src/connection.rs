//! Per-connection command loop.
//!
//! One handler task owns one accepted stream and one slot, and walks the
//! connection through its lifecycle: report the slot number, learn the
//! peer's declared name, then serve line-delimited commands until `exit`,
//! EOF, or an I/O error. Every exit path releases the slot and stamps the
//! session; an error here never touches any other connection.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf, WriteHalf};

use depot_core::wire::{self, Command};

use crate::state::{ServerState, SlotHandle};
use crate::transfer;

pub struct ConnectionHandler<S> {
    reader: BufReader<ReadHalf<S>>,
    writer: WriteHalf<S>,
    peer: SocketAddr,
    state: Arc<ServerState>,
    slot: SlotHandle,
    name: Option<String>,
    files_root: PathBuf,
    ack_timeout: Option<Duration>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        peer: SocketAddr,
        slot: SlotHandle,
        state: Arc<ServerState>,
        files_root: PathBuf,
        ack_timeout: Option<Duration>,
    ) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            peer,
            state,
            slot,
            name: None,
            files_root,
            ack_timeout,
        }
    }

    /// Drive the connection to completion. Errors are logged, never returned:
    /// a failed peer must not take anything else down with it.
    pub async fn run(mut self) {
        match self.serve().await {
            Ok(()) => tracing::info!(
                peer = %self.peer,
                name = self.name.as_deref().unwrap_or("<unnamed>"),
                "client disconnected"
            ),
            Err(e) => tracing::warn!(peer = %self.peer, error = %e, "connection closed on error"),
        }

        // Closing: release the slot, stamp the session (only if the peer
        // ever identified itself), then drop the socket. The halves are kept
        // alive past the state updates so a peer observing EOF can rely on
        // the slot already being free.
        let ConnectionHandler {
            slot,
            name,
            state,
            reader: _reader,
            writer: _writer,
            ..
        } = self;
        slot.release();
        if let Some(name) = name {
            state.mark_disconnected(&name);
        }
    }

    async fn serve(&mut self) -> Result<()> {
        // Accepted: report the 1-based slot number, then learn the name.
        self.writer
            .write_all(self.slot.number().to_string().as_bytes())
            .await?;
        self.writer.flush().await?;

        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        let name = line.trim().to_string();

        // Identified.
        self.slot.mark_active();
        self.state.upsert_session(&name, self.peer);
        self.name = Some(name.clone());
        tracing::info!(name = %name, peer = %self.peer, slot = self.slot.number(), "client connected");

        // Serving.
        loop {
            line.clear();
            if self.reader.read_line(&mut line).await? == 0 {
                return Ok(());
            }
            let input = line.trim();
            tracing::debug!(name = %name, input, "command received");

            match Command::parse(input) {
                Command::Exit => return Ok(()),
                Command::Status => {
                    let status = self.state.render_status();
                    self.writer.write_all(status.as_bytes()).await?;
                    self.writer.flush().await?;
                }
                Command::List => {
                    let listing = list_files(&self.files_root);
                    self.writer.write_all(listing.as_bytes()).await?;
                    self.writer.flush().await?;
                }
                Command::Get(filename) => {
                    let result = transfer::send_file(
                        &mut self.reader,
                        &mut self.writer,
                        &self.files_root,
                        &filename,
                        self.ack_timeout,
                    )
                    .await;
                    match result {
                        Ok(bytes) => {
                            tracing::info!(name = %name, filename = %filename, bytes, "file sent")
                        }
                        Err(e) if e.is_fatal() => return Err(e.into()),
                        // Not-found and local-file failures were already
                        // reported to the peer; the session keeps serving.
                        Err(e) => tracing::warn!(
                            name = %name,
                            filename = %filename,
                            error = %e,
                            "transfer not completed"
                        ),
                    }
                }
                Command::Other(text) => {
                    let reply = format!("{}{}", text, wire::ACK_SUFFIX);
                    self.writer.write_all(reply.as_bytes()).await?;
                    self.writer.flush().await?;
                }
            }
        }
    }
}

/// The `list` reply: file names under the repository root, or the designated
/// empty-repository message. Sorted for a stable listing.
fn list_files(root: &Path) -> String {
    match std::fs::read_dir(root) {
        Ok(entries) => {
            let mut names: Vec<String> = entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect();
            if names.is_empty() {
                return wire::NO_FILES.to_string();
            }
            names.sort();
            format!("{}\n{}", wire::FILE_LIST_HEADER, names.join("\n"))
        }
        Err(e) => format!("Error accessing files: {e}"),
    }
}
