use crate::*;

use anyhow::Result;

use depot_core::wire;

/// Unrecognized input echoes back with the ACK suffix, verbatim.
#[tokio::test]
async fn echo_appends_ack() -> Result<()> {
    let server = TestServer::start(1).await?;
    let mut client = connect(server.addr).await?;

    client.send_line("hello").await?;
    assert_eq!(client.recv().await?, "hello ACK");

    // Case and inner whitespace are preserved.
    client.send_line("Hello  World").await?;
    assert_eq!(client.recv().await?, "Hello  World ACK");
    Ok(())
}

/// Command keywords match regardless of case.
#[tokio::test]
async fn keywords_are_case_insensitive() -> Result<()> {
    let server = TestServer::start(1).await?;
    let mut client = connect(server.addr).await?;

    client.send_line("STATUS").await?;
    assert!(client.recv().await?.starts_with(wire::STATUS_HEADER));

    client.send_line("List").await?;
    assert_eq!(client.recv().await?, wire::NO_FILES);
    Ok(())
}

/// `list` reports the empty-repository message, then lists placed files
/// verbatim.
#[tokio::test]
async fn list_reflects_repository_contents() -> Result<()> {
    let server = TestServer::start(1).await?;
    let mut client = connect(server.addr).await?;

    client.send_line("list").await?;
    assert_eq!(client.recv().await?, wire::NO_FILES);

    std::fs::write(server.files_dir.join("report.txt"), b"quarterly")?;
    client.send_line("list").await?;
    assert_eq!(client.recv().await?, "Available files:\nreport.txt");

    std::fs::write(server.files_dir.join("archive.tar"), b"bits")?;
    client.send_line("list").await?;
    assert_eq!(
        client.recv().await?,
        "Available files:\narchive.tar\nreport.txt"
    );
    Ok(())
}
