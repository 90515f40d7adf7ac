use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::broadcast;

use depot_services::{Listener, ServerState};

// ── Harness ───────────────────────────────────────────────────────────────────

static NEXT_SCRATCH: AtomicUsize = AtomicUsize::new(0);

/// A unique scratch directory, created empty.
pub fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "depot-it-{tag}-{}-{}",
        std::process::id(),
        NEXT_SCRATCH.fetch_add(1, Ordering::Relaxed)
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// An in-process daemon bound to an ephemeral loopback port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub files_dir: PathBuf,
    shutdown: broadcast::Sender<()>,
}

impl TestServer {
    pub async fn start(capacity: usize) -> Result<TestServer> {
        let files_dir = scratch_dir("files");
        let state = ServerState::new(capacity);
        let (shutdown, _) = broadcast::channel::<()>(1);

        let listener = Listener::bind(
            "127.0.0.1:0",
            state,
            files_dir.clone(),
            None,
            shutdown.subscribe(),
        )
        .await?;
        let addr = listener.local_addr()?;
        tokio::spawn(listener.run());

        Ok(TestServer {
            addr,
            files_dir,
            shutdown,
        })
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
        let _ = std::fs::remove_dir_all(&self.files_dir);
    }
}

/// Read one raw frame (whatever arrives in a single read).
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String> {
    let mut buf = [0u8; 8192];
    let n = reader.read(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf[..n]).to_string())
}

/// One connected, identified client.
pub struct TestClient {
    pub name: String,
    pub reader: BufReader<OwnedReadHalf>,
    pub writer: OwnedWriteHalf,
}

/// Connect and complete the greeting/name exchange, deriving the name from
/// the slot number the way the real client does.
pub async fn connect(addr: SocketAddr) -> Result<TestClient> {
    let stream = TcpStream::connect(addr).await?;
    let (read_half, write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut writer = write_half;

    let greeting = read_frame(&mut reader).await?;
    let slot: usize = greeting
        .trim()
        .parse()
        .with_context(|| format!("unexpected greeting: {greeting:?}"))?;
    let name = format!("Client0{slot}");
    writer.write_all(format!("{name}\n").as_bytes()).await?;
    writer.flush().await?;

    Ok(TestClient {
        name,
        reader,
        writer,
    })
}

impl TestClient {
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(format!("{line}\n").as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub async fn recv(&mut self) -> Result<String> {
        read_frame(&mut self.reader).await
    }

    /// Send `exit` and drain to EOF. The server keeps the socket open until
    /// the slot is released, so EOF means the slot is free again.
    pub async fn exit(mut self) -> Result<()> {
        self.send_line("exit").await?;
        let mut buf = [0u8; 64];
        while self.reader.read(&mut buf).await? > 0 {}
        Ok(())
    }
}
