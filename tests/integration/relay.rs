//! Payload forwarding between session members.

use serde_json::json;

use crate::*;

#[tokio::test]
async fn chat_text_reaches_partner_only() -> Result<()> {
    let server = TestServer::start().await;
    let (mut a, mut b, sid) = chat_pair(&server).await?;

    a.send(json!({"type": "relay", "session_id": sid, "payload": {"text": "hi there"}}))
        .await?;
    let got = b.expect("relay").await?;
    assert_eq!(got["session_id"], sid.as_str());
    assert_eq!(got["from"], a.id.as_str());
    assert_eq!(got["payload"], json!({"text": "hi there"}));
    assert!(got["sent_at"].as_u64().is_some_and(|t| t > 0));
    assert!(a.is_quiet().await);
    Ok(())
}

#[tokio::test]
async fn call_signals_are_forwarded_verbatim() -> Result<()> {
    let server = TestServer::start().await;
    let mut a = Client::connect(&server, "/ws/call").await?;
    let mut b = Client::connect(&server, "/ws/call").await?;
    a.join().await?;
    let (sid, _) = b.join_and_match().await?;
    a.matched().await?;

    let offer = json!({
        "kind": "offer",
        "data": {"sdp": "v=0\r\no=- 46117 2 IN IP4 127.0.0.1", "type": "offer"}
    });
    a.send(json!({"type": "relay", "session_id": sid, "payload": offer}))
        .await?;
    assert_eq!(b.expect("relay").await?["payload"], offer);

    let candidate = json!({
        "kind": "ice-candidate",
        "data": {"candidate": "candidate:1 1 udp 2122260223 10.0.0.2 54321 typ host", "sdpMLineIndex": 0}
    });
    b.send(json!({"type": "relay", "session_id": sid, "payload": candidate}))
        .await?;
    assert_eq!(a.expect("relay").await?["payload"], candidate);
    Ok(())
}

#[tokio::test]
async fn outsider_cannot_inject_into_session() -> Result<()> {
    let server = TestServer::start().await;
    let (mut a, mut b, sid) = chat_pair(&server).await?;
    let mut outsider = Client::chat(&server).await?;

    outsider
        .send(json!({"type": "relay", "session_id": sid, "payload": {"text": "boo"}}))
        .await?;
    assert!(a.is_quiet().await);
    assert!(b.is_quiet().await);
    assert!(outsider.is_quiet().await);

    let snap = server
        .wait_for_broker("chat", |b| b["dropped"] == 1)
        .await?;
    assert_eq!(snap["relayed"], 0);
    Ok(())
}
