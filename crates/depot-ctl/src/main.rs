//! depot-ctl — interactive command-line client for the depot daemon.

use std::path::PathBuf;

use anyhow::{Context, Result};

mod client;

use client::Client;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_DOWNLOADS: &str = "downloads";

fn print_usage() {
    println!("Usage: depot-ctl [--host <host>] [--port <port>] [--dir <dir>]");
    println!();
    println!("Options:");
    println!("  --host <host>   Server host (default: {DEFAULT_HOST})");
    println!(
        "  --port <port>   Server port (default: {})",
        depot_core::wire::DEFAULT_PORT
    );
    println!("  --dir <dir>     Download directory (default: {DEFAULT_DOWNLOADS})");
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut host = DEFAULT_HOST.to_string();
    let mut port = depot_core::wire::DEFAULT_PORT;
    let mut downloads = PathBuf::from(DEFAULT_DOWNLOADS);

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--host" => {
                i += 1;
                host = args.get(i).context("--host requires a value")?.clone();
            }
            "--port" => {
                i += 1;
                port = args
                    .get(i)
                    .context("--port requires a value")?
                    .parse()
                    .context("--port must be a number")?;
            }
            "--dir" => {
                i += 1;
                downloads = PathBuf::from(args.get(i).context("--dir requires a value")?);
            }
            "help" | "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {other}");
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    Client::new(host, port, downloads).run().await
}
