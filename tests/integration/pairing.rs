//! Queueing and matching over real WebSocket connections.

use serde_json::json;

use crate::*;

/// P1, P2, P3 join → (P1, P2) paired, P3 waits; P3 re-joins → unchanged;
/// P4 joins → (P3, P4) paired.
#[tokio::test]
async fn three_joiners_then_fourth() -> Result<()> {
    let server = TestServer::start().await;
    let mut p1 = Client::chat(&server).await?;
    let mut p2 = Client::chat(&server).await?;
    let mut p3 = Client::chat(&server).await?;

    let ack = p1.join().await?;
    assert_eq!(ack["position"], 1);
    assert_eq!(ack["queue_size"], 1);

    let ack = p2.join().await?;
    assert_eq!(ack["position"], 2);
    let (s1, partner) = p2.matched().await?;
    assert_eq!(partner, p1.id);
    assert_eq!(p1.matched().await?, (s1.clone(), p2.id.clone()));

    let ack = p3.join().await?;
    assert_eq!(ack["position"], 1);
    assert!(p1.is_quiet().await);

    // Duplicate join: same single entry.
    let again = p3.join().await?;
    assert_eq!(again["position"], 1);
    assert_eq!(again["queue_size"], 1);

    let mut p4 = Client::chat(&server).await?;
    let (s2, partner) = p4.join_and_match().await?;
    assert_eq!(partner, p3.id);
    assert_ne!(s1, s2);
    assert_eq!(p3.matched().await?, (s2, p4.id.clone()));

    let snap = server
        .wait_for_broker("chat", |b| b["active_sessions"] == 2)
        .await?;
    assert_eq!(snap["queued"], 0);
    assert_eq!(snap["consistent"], true);
    Ok(())
}

#[tokio::test]
async fn chat_and_call_queues_are_separate() -> Result<()> {
    let server = TestServer::start().await;
    let mut chatter = Client::chat(&server).await?;
    let mut caller = Client::connect(&server, "/ws/call").await?;

    chatter.join().await?;
    caller.join().await?;
    assert!(chatter.is_quiet().await);
    assert!(caller.is_quiet().await);

    let mut second_caller = Client::connect(&server, "/ws/call").await?;
    let (_, partner) = second_caller.join_and_match().await?;
    assert_eq!(partner, caller.id);
    Ok(())
}

#[tokio::test]
async fn partner_name_is_shared_on_match() -> Result<()> {
    let server = TestServer::start().await;
    let mut a = Client::chat(&server).await?;
    let mut b = Client::chat(&server).await?;

    a.send(json!({"type": "set-name", "name": "  mina  "})).await?;
    b.send(json!({"type": "set-name", "name": "unknown"})).await?;
    a.join().await?;
    b.join().await?;

    let seen_by_b = b.expect("matched").await?;
    assert_eq!(seen_by_b["partner_name"], "mina");
    let seen_by_a = a.expect("matched").await?;
    assert!(seen_by_a["partner_name"].is_null());
    Ok(())
}

#[tokio::test]
async fn leave_queue_is_acknowledged() -> Result<()> {
    let server = TestServer::start().await;
    let mut a = Client::chat(&server).await?;
    a.join().await?;

    a.send(json!({"type": "leave-queue"})).await?;
    a.expect("dequeued").await?;

    // A second leave is a no-op.
    a.send(json!({"type": "leave-queue"})).await?;
    assert!(a.is_quiet().await);

    let mut b = Client::chat(&server).await?;
    b.join().await?;
    assert!(b.is_quiet().await);
    Ok(())
}

#[tokio::test]
async fn malformed_frames_are_ignored() -> Result<()> {
    let server = TestServer::start().await;
    let mut a = Client::chat(&server).await?;

    a.send_raw("not json at all").await?;
    a.send(json!({"type": "teleport"})).await?;
    a.send(json!({"type": "relay", "session_id": "zz", "payload": {"text": "x"}}))
        .await?;
    assert!(a.is_quiet().await);

    // Still connected and usable.
    let ack = a.join().await?;
    assert_eq!(ack["position"], 1);
    Ok(())
}

#[tokio::test]
async fn even_joiners_pair_in_arrival_order() -> Result<()> {
    let server = TestServer::start().await;
    let mut clients = Vec::new();
    for _ in 0..8 {
        let mut c = Client::chat(&server).await?;
        c.join().await?;
        clients.push(c);
    }

    for pair in clients.chunks_mut(2) {
        let (first, second) = pair.split_at_mut(1);
        let (sid, partner) = first[0].matched().await?;
        assert_eq!(partner, second[0].id);
        assert_eq!(second[0].matched().await?, (sid, first[0].id.clone()));
    }

    server
        .wait_for_broker("chat", |b| b["active_sessions"] == 4 && b["queued"] == 0)
        .await?;
    Ok(())
}
