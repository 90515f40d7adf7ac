//! The dialer — connect, identify, then run two loops: a background task
//! receiving server pushes and a foreground loop sending the user's command
//! lines. A boolean flag suppresses new commands while a download is in
//! progress; it gates input timing only, the transfer itself is synchronous
//! on its own socket reads.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

use depot_core::wire;
use depot_services::transfer;

pub struct Client {
    host: String,
    port: u16,
    downloads: PathBuf,
}

impl Client {
    pub fn new(host: String, port: u16, downloads: PathBuf) -> Self {
        Self {
            host,
            port,
            downloads,
        }
    }

    pub async fn run(self) -> Result<()> {
        std::fs::create_dir_all(&self.downloads).with_context(|| {
            format!(
                "failed to create download directory {}",
                self.downloads.display()
            )
        })?;

        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .with_context(|| {
                format!(
                    "failed to connect to {}:{} — is depotd running?",
                    self.host, self.port
                )
            })?;
        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        // Greeting: a 1-based slot number, or the rejection text.
        let mut buf = [0u8; 256];
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            bail!("server closed the connection before greeting");
        }
        let greeting = String::from_utf8_lossy(&buf[..n]).to_string();
        if greeting.contains("Server is full") {
            println!("{greeting}");
            return Ok(());
        }
        let slot: usize = greeting
            .trim()
            .parse()
            .with_context(|| format!("unexpected greeting from server: {greeting:?}"))?;

        // The display name is derived from the slot number, so a freed slot
        // reproduces its previous occupant's name.
        let name = format!("Client0{slot}");

        let writer = Arc::new(Mutex::new(write_half));
        {
            let mut w = writer.lock().await;
            w.write_all(format!("{name}\n").as_bytes()).await?;
            w.flush().await?;
        }
        println!("Client name: {name}");
        print_help();

        // Set while a download is running; new commands wait for it.
        let receiving = Arc::new(AtomicBool::new(false));

        let recv_task = tokio::spawn(receive_loop(
            reader,
            Arc::clone(&writer),
            Arc::clone(&receiving),
            self.downloads.clone(),
            name.clone(),
        ));

        let mut stdin = BufReader::new(tokio::io::stdin()).lines();
        loop {
            if receiving.load(Ordering::Relaxed) {
                tokio::time::sleep(Duration::from_millis(50)).await;
                continue;
            }

            prompt(&name);
            let Some(line) = stdin.next_line().await? else {
                break;
            };
            let message = line.trim().to_string();
            if message.is_empty() {
                continue;
            }

            {
                let mut w = writer.lock().await;
                w.write_all(format!("{message}\n").as_bytes()).await?;
                w.flush().await?;
            }

            if message.eq_ignore_ascii_case("exit") {
                break;
            }
        }

        recv_task.abort();
        Ok(())
    }
}

fn print_help() {
    println!();
    println!("Available commands:");
    println!("- status: Get server cache information");
    println!("- list: Get list of available files");
    println!("- get <filename>: Download a file");
    println!("- exit: Close connection");
    println!("- Any other message will be echoed back with ACK");
    println!();
}

fn prompt(name: &str) {
    print!("{name}> ");
    std::io::stdout().flush().ok();
}

/// Receive server pushes until the connection closes. A frame carrying the
/// transfer notice switches into the chunk/ack receiver; everything else is
/// printed as-is.
async fn receive_loop(
    mut reader: BufReader<OwnedReadHalf>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
    receiving: Arc<AtomicBool>,
    downloads: PathBuf,
    name: String,
) {
    let mut buf = [0u8; wire::CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => {
                println!("\rServer closed the connection.");
                break;
            }
            Ok(n) => n,
            Err(_) => break,
        };
        let text = String::from_utf8_lossy(&buf[..n]).to_string();

        if let Some(rest) = text.strip_prefix(wire::SENDING_FILE_PREFIX) {
            receiving.store(true, Ordering::Relaxed);
            let filename = rest.trim().to_string();
            println!("\rReceiving file: {filename}");

            let mut w = writer.lock().await;
            match transfer::receive_file(&mut reader, &mut *w, &downloads, &filename, None).await {
                Ok(bytes) => println!("File downloaded successfully ({bytes} bytes)."),
                Err(e) => eprintln!("Error receiving file: {e}"),
            }
            drop(w);
            receiving.store(false, Ordering::Relaxed);
            prompt(&name);
        } else {
            println!("\rReceived: {text}");
            prompt(&name);
        }
    }
}
