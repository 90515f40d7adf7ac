use crate::*;

use anyhow::Result;

use depot_services::transfer::receive_file;

/// `get` reconstructs the file byte-for-byte through the chunk/ack loop,
/// and the command loop is live again afterwards.
#[tokio::test]
async fn get_round_trips_multi_chunk_file() -> Result<()> {
    let server = TestServer::start(1).await?;
    let downloads = scratch_dir("downloads");

    // Crosses two chunk boundaries and ends mid-chunk.
    let content: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(server.files_dir.join("data.bin"), &content)?;

    let mut client = connect(server.addr).await?;
    client.send_line("get data.bin").await?;

    let notice = client.recv().await?;
    assert_eq!(notice, "Sending file: data.bin");

    let received = receive_file(
        &mut client.reader,
        &mut client.writer,
        &downloads,
        "data.bin",
        None,
    )
    .await?;
    assert_eq!(received, content.len() as u64);
    assert_eq!(std::fs::read(downloads.join("data.bin"))?, content);

    // Single-file-at-a-time: the handler is back in its command loop.
    client.send_line("ping").await?;
    assert_eq!(client.recv().await?, "ping ACK");

    let _ = std::fs::remove_dir_all(&downloads);
    Ok(())
}

/// A small file fits one chunk and still round-trips exactly.
#[tokio::test]
async fn get_round_trips_small_file() -> Result<()> {
    let server = TestServer::start(1).await?;
    let downloads = scratch_dir("downloads");

    std::fs::write(server.files_dir.join("note.txt"), b"depot says hi")?;

    let mut client = connect(server.addr).await?;
    client.send_line("get note.txt").await?;
    assert_eq!(client.recv().await?, "Sending file: note.txt");

    receive_file(
        &mut client.reader,
        &mut client.writer,
        &downloads,
        "note.txt",
        None,
    )
    .await?;
    assert_eq!(std::fs::read(downloads.join("note.txt"))?, b"depot says hi");

    let _ = std::fs::remove_dir_all(&downloads);
    Ok(())
}

/// A missing file yields an error frame naming it; no rendezvous happens
/// and the connection stays usable.
#[tokio::test]
async fn get_missing_file_reports_error_and_keeps_serving() -> Result<()> {
    let server = TestServer::start(1).await?;

    let mut client = connect(server.addr).await?;
    client.send_line("get ghost.txt").await?;
    assert_eq!(client.recv().await?, "Error: File 'ghost.txt' not found");

    // Had the server entered the transfer loop it would now be blocked
    // waiting for a readiness frame; the direct echo proves it is not.
    client.send_line("hello").await?;
    assert_eq!(client.recv().await?, "hello ACK");
    Ok(())
}
