//! Chunked file transfer — both roles of the lock-step channel.
//!
//! The protocol is strictly half-duplex: the sender moves one chunk, then
//! blocks for one content-agnostic frame from the receiver before moving the
//! next. Exactly one frame is in flight in each direction at any time, so
//! throughput is bounded by round-trip latency. The stream carries no length
//! prefixes; the transfer ends at the literal [`wire::END_OF_FILE`] marker,
//! compared with exact equality (see `wire.rs` for the collision caveat).
//!
//! Both ends share this module: the server calls [`send_file`] for `get`,
//! the client calls [`receive_file`]. Functions are generic over the stream
//! halves so tests drive them over `tokio::io::duplex`.

use std::path::Path;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use depot_core::wire;

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Requested name does not resolve to a file; reported to the peer,
    /// no transfer loop entered.
    #[error("file '{0}' not found")]
    NotFound(String),
    /// Local file I/O failed. The transfer is abandoned but the stream is
    /// still usable; a partial file may remain on the receiver's disk.
    #[error("local file I/O failed: {0}")]
    File(#[source] std::io::Error),
    /// The stream itself failed or the peer vanished mid-transfer.
    #[error("peer I/O failed: {0}")]
    Peer(#[source] std::io::Error),
    /// The configured ack timeout elapsed waiting for the peer.
    #[error("timed out waiting for a frame from the peer")]
    Timeout,
}

impl TransferError {
    /// True when the session must close: the stream is no longer usable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransferError::Peer(_) | TransferError::Timeout)
    }
}

/// Block for one readiness/ack frame. The payload is ignored; arrival is
/// the signal.
async fn read_signal<R>(reader: &mut R, timeout: Option<Duration>) -> Result<(), TransferError>
where
    R: AsyncRead + Unpin,
{
    let mut signal = [0u8; 64];
    let n = match timeout {
        Some(limit) => tokio::time::timeout(limit, reader.read(&mut signal))
            .await
            .map_err(|_| TransferError::Timeout)?,
        None => reader.read(&mut signal).await,
    }
    .map_err(TransferError::Peer)?;

    if n == 0 {
        return Err(TransferError::Peer(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "peer closed during transfer",
        )));
    }
    Ok(())
}

/// Sender role: stream `<root>/<filename>` to the peer in acknowledged
/// chunks. Returns the number of file bytes sent.
///
/// A missing file is reported as a text frame and no rendezvous happens.
/// After the notice frame, the sender blocks for one readiness frame before
/// the first chunk so the receiver's file-open cannot race it.
pub async fn send_file<R, W>(
    reader: &mut R,
    writer: &mut W,
    root: &Path,
    filename: &str,
    ack_timeout: Option<Duration>,
) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let path = root.join(filename);

    if tokio::fs::metadata(&path).await.is_err() {
        let notice = format!("Error: File '{filename}' not found");
        writer
            .write_all(notice.as_bytes())
            .await
            .map_err(TransferError::Peer)?;
        writer.flush().await.map_err(TransferError::Peer)?;
        return Err(TransferError::NotFound(filename.to_string()));
    }

    let mut file = match File::open(&path).await {
        Ok(f) => f,
        Err(e) => return report_file_error(writer, e).await,
    };

    let notice = format!("{}{}", wire::SENDING_FILE_PREFIX, filename);
    writer
        .write_all(notice.as_bytes())
        .await
        .map_err(TransferError::Peer)?;
    writer.flush().await.map_err(TransferError::Peer)?;

    // Rendezvous: the receiver opens its file, then signals readiness.
    read_signal(reader, ack_timeout).await?;

    let mut buf = [0u8; wire::CHUNK_SIZE];
    let mut sent: u64 = 0;
    loop {
        let n = match file.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => return report_file_error(writer, e).await,
        };
        if n == 0 {
            break;
        }
        writer
            .write_all(&buf[..n])
            .await
            .map_err(TransferError::Peer)?;
        writer.flush().await.map_err(TransferError::Peer)?;
        sent += n as u64;

        read_signal(reader, ack_timeout).await?;
    }

    writer
        .write_all(wire::END_OF_FILE)
        .await
        .map_err(TransferError::Peer)?;
    writer.flush().await.map_err(TransferError::Peer)?;

    tracing::debug!(filename, bytes = sent, "file sent");
    Ok(sent)
}

/// Best-effort error frame for a local-file failure, then abandon.
async fn report_file_error<W>(writer: &mut W, e: std::io::Error) -> Result<u64, TransferError>
where
    W: AsyncWrite + Unpin,
{
    let notice = format!("Error sending file: {e}");
    let _ = writer.write_all(notice.as_bytes()).await;
    let _ = writer.flush().await;
    Err(TransferError::File(e))
}

/// Receiver role: write incoming chunks to `<dest_dir>/<filename>` until the
/// end-of-stream marker or the peer goes away. Returns bytes written.
///
/// The filename is used exactly as sent. The caller is expected to have
/// consumed the `"Sending file: "` notice already; this function opens the
/// local file, sends the readiness frame, and runs the chunk/ack loop.
pub async fn receive_file<R, W>(
    reader: &mut R,
    writer: &mut W,
    dest_dir: &Path,
    filename: &str,
    read_timeout: Option<Duration>,
) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let path = dest_dir.join(filename);
    let mut file = File::create(&path).await.map_err(TransferError::File)?;

    writer
        .write_all(wire::READY)
        .await
        .map_err(TransferError::Peer)?;
    writer.flush().await.map_err(TransferError::Peer)?;

    let mut buf = [0u8; wire::CHUNK_SIZE];
    let mut written: u64 = 0;
    loop {
        let n = match read_timeout {
            Some(limit) => tokio::time::timeout(limit, reader.read(&mut buf))
                .await
                .map_err(|_| TransferError::Timeout)?,
            None => reader.read(&mut buf).await,
        }
        .map_err(TransferError::Peer)?;

        // Peer gone; keep what arrived.
        if n == 0 {
            break;
        }
        let frame = &buf[..n];
        if wire::is_end_of_stream(frame) {
            break;
        }

        file.write_all(frame).await.map_err(TransferError::File)?;
        written += n as u64;

        writer
            .write_all(wire::READY)
            .await
            .map_err(TransferError::Peer)?;
        writer.flush().await.map_err(TransferError::Peer)?;
    }

    file.flush().await.map_err(TransferError::File)?;
    tracing::debug!(filename, bytes = written, "file received");
    Ok(written)
}
