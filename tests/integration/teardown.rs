//! Session teardown by end-session and by disconnect.

use serde_json::json;

use crate::*;

#[tokio::test]
async fn manual_end_notifies_partner_once() -> Result<()> {
    let server = TestServer::start().await;
    let (mut a, mut b, sid) = chat_pair(&server).await?;

    a.send(json!({"type": "end-session", "session_id": sid})).await?;
    let ended = b.expect("session-ended").await?;
    assert_eq!(ended["session_id"], sid.as_str());
    assert_eq!(ended["reason"], "manual");
    assert!(a.is_quiet().await);

    // The session is gone: relays and repeated ends do nothing.
    b.send(json!({"type": "relay", "session_id": sid, "payload": {"text": "hello?"}}))
        .await?;
    b.send(json!({"type": "end-session", "session_id": sid})).await?;
    assert!(a.is_quiet().await);
    assert!(b.is_quiet().await);

    // Both stay connected and can queue again.
    a.join().await?;
    let (_, partner) = b.join_and_match().await?;
    assert_eq!(partner, a.id);
    Ok(())
}

#[tokio::test]
async fn both_ending_at_once_yields_one_notice() -> Result<()> {
    let server = TestServer::start().await;
    let (mut a, mut b, sid) = chat_pair(&server).await?;

    let end = json!({"type": "end-session", "session_id": sid});
    a.send(end.clone()).await?;
    b.send(end).await?;

    let mut notices = 0;
    for client in [&mut a, &mut b] {
        if !client.is_quiet().await {
            notices += 1;
        }
    }
    assert_eq!(notices, 1);

    server
        .wait_for_broker("chat", |b| b["sessions_ended"] == 1 && b["idle"] == 2)
        .await?;
    Ok(())
}

#[tokio::test]
async fn disconnect_notifies_partner_with_peer_left() -> Result<()> {
    let server = TestServer::start().await;
    let (a, mut b, sid) = chat_pair(&server).await?;

    a.close().await?;
    let ended = b.expect("session-ended").await?;
    assert_eq!(ended["session_id"], sid.as_str());
    assert_eq!(ended["reason"], "peer-left");

    let snap = server
        .wait_for_broker("chat", |b| b["connected"] == 1)
        .await?;
    assert_eq!(snap["active_sessions"], 0);
    assert_eq!(snap["idle"], 1);
    Ok(())
}

#[tokio::test]
async fn dropped_socket_counts_as_disconnect() -> Result<()> {
    let server = TestServer::start().await;
    let (a, mut b, _) = chat_pair(&server).await?;

    // No close handshake at all.
    drop(a);
    assert_eq!(b.expect("session-ended").await?["reason"], "peer-left");
    Ok(())
}

#[tokio::test]
async fn queued_disconnect_is_silent() -> Result<()> {
    let server = TestServer::start().await;
    let mut p1 = Client::chat(&server).await?;
    let mut bystander = Client::chat(&server).await?;
    p1.join().await?;

    p1.close().await?;
    server
        .wait_for_broker("chat", |b| b["connected"] == 1 && b["queued"] == 0)
        .await?;
    assert!(bystander.is_quiet().await);

    // The departed waiter is not matched with the next joiner.
    bystander.join().await?;
    assert!(bystander.is_quiet().await);
    Ok(())
}
