use crate::*;

use anyhow::Result;

/// `status` reflects live and exited sessions: a live session renders the
/// "Still connected" placeholder, an exited one renders its timestamp.
#[tokio::test]
async fn status_tracks_connect_and_disconnect() -> Result<()> {
    let server = TestServer::start(2).await?;

    let mut c1 = connect(server.addr).await?;
    let c2 = connect(server.addr).await?;

    c1.send_line("status").await?;
    let status = c1.recv().await?;
    assert!(status.contains("Client: Client01"));
    assert!(status.contains("Client: Client02"));
    assert_eq!(status.matches("Still connected").count(), 2);

    c2.exit().await?;

    c1.send_line("status").await?;
    let status = c1.recv().await?;
    // Both sessions are still listed — records are stamped, never deleted.
    assert!(status.contains("Client: Client01"));
    assert!(status.contains("Client: Client02"));
    assert_eq!(status.matches("Still connected").count(), 1);
    Ok(())
}

/// Names derive from slot numbers, so a reconnect through a freed slot
/// reuses the previous occupant's name and overwrites its record. This
/// collision is a property of the protocol, asserted rather than hidden.
#[tokio::test]
async fn name_reuse_overwrites_prior_session() -> Result<()> {
    let server = TestServer::start(1).await?;

    let c1 = connect(server.addr).await?;
    assert_eq!(c1.name, "Client01");
    c1.exit().await?;

    let mut c2 = connect(server.addr).await?;
    assert_eq!(c2.name, "Client01", "freed slot reproduces the name");

    c2.send_line("status").await?;
    let status = c2.recv().await?;
    assert_eq!(
        status.matches("Client: Client01").count(),
        1,
        "the reconnect must overwrite, not duplicate, the record"
    );
    assert_eq!(status.matches("Still connected").count(), 1);
    Ok(())
}
