//! duet integration test harness.
//!
//! Every test boots its own gateway and admin API in-process on ephemeral
//! 127.0.0.1 ports and talks to them over real sockets: WebSocket clients
//! for participants, HTTP for the admin surface. Nothing is shared between
//! tests, so they run in parallel.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use duet_api::ApiState;
use duet_core::config::DuetConfig;

mod pairing;
mod relay;
mod teardown;

// ── Harness ───────────────────────────────────────────────────────────────────

/// How long a client waits for an expected event.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(3);

/// How long "nothing arrives" is observed for.
pub const QUIET_PERIOD: Duration = Duration::from_millis(200);

pub struct TestServer {
    pub ws_addr: SocketAddr,
    pub api_addr: SocketAddr,
    pub state: ApiState,
    shutdown_tx: broadcast::Sender<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::with_config(DuetConfig::default()).await
    }

    pub async fn with_config(config: DuetConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let state = ApiState::from_config(&config, shutdown_tx.clone());

        let ws_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let api_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let ws_addr = ws_listener.local_addr().unwrap();
        let api_addr = api_listener.local_addr().unwrap();

        tokio::spawn(duet_api::serve(
            ws_listener,
            duet_api::gateway_router(state.clone()),
            shutdown_tx.subscribe(),
        ));
        tokio::spawn(duet_api::serve(
            api_listener,
            duet_api::api_router(state.clone()),
            shutdown_tx.subscribe(),
        ));

        Self {
            ws_addr,
            api_addr,
            state,
            shutdown_tx,
        }
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.ws_addr, path)
    }

    pub fn api_url(&self, path: &str) -> String {
        format!("http://{}/api{}", self.api_addr, path)
    }

    pub async fn api_get(&self, path: &str) -> Result<(u16, Value)> {
        let resp = reqwest::get(self.api_url(path)).await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok((status, serde_json::from_str(&body).unwrap_or(Value::String(body))))
    }

    pub async fn api_post(&self, path: &str, body: Value) -> Result<(u16, Value)> {
        let resp = reqwest::Client::new()
            .post(self.api_url(path))
            .json(&body)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok((status, serde_json::from_str(&body).unwrap_or(Value::String(body))))
    }

    /// Poll `/status` until `check` holds for the named broker's snapshot.
    pub async fn wait_for_broker(&self, broker: &str, check: impl Fn(&Value) -> bool) -> Result<Value> {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        loop {
            let (_, status) = self.api_get("/status").await?;
            let snap = status["brokers"]
                .as_array()
                .and_then(|bs| bs.iter().find(|b| b["broker"] == broker))
                .cloned()
                .with_context(|| format!("broker {broker} missing from status"))?;
            if check(&snap) {
                return Ok(snap);
            }
            if tokio::time::Instant::now() > deadline {
                bail!("broker {broker} never reached expected state: {snap}");
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// One participant connected over a real WebSocket.
pub struct Client {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    pub id: String,
}

impl Client {
    /// Connect and consume the `hello` greeting.
    pub async fn connect(server: &TestServer, path: &str) -> Result<Self> {
        let (ws, _) = connect_async(server.ws_url(path))
            .await
            .with_context(|| format!("failed to connect to {path}"))?;
        let mut client = Self {
            ws,
            id: String::new(),
        };
        let hello = client.recv().await?;
        if hello["type"] != "hello" {
            bail!("expected hello, got {hello}");
        }
        client.id = hello["participant_id"]
            .as_str()
            .context("hello without participant_id")?
            .to_string();
        Ok(client)
    }

    pub async fn chat(server: &TestServer) -> Result<Self> {
        Self::connect(server, "/ws/chat").await
    }

    pub async fn send(&mut self, event: Value) -> Result<()> {
        self.send_raw(&event.to_string()).await
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.ws.send(Message::Text(text.to_string().into())).await?;
        Ok(())
    }

    /// Next event other than `queue-update`.
    pub async fn recv(&mut self) -> Result<Value> {
        loop {
            let msg = tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .context("timed out waiting for event")?
                .context("connection closed")??;
            if let Message::Text(text) = msg {
                let event: Value = serde_json::from_str(text.as_str())?;
                if event["type"] != "queue-update" {
                    return Ok(event);
                }
            }
        }
    }

    /// Next event, which must have the given `type`.
    pub async fn expect(&mut self, kind: &str) -> Result<Value> {
        let event = self.recv().await?;
        if event["type"] != kind {
            bail!("expected {kind}, got {event}");
        }
        Ok(event)
    }

    /// True if nothing but queue chatter arrives for a short while.
    pub async fn is_quiet(&mut self) -> bool {
        let deadline = tokio::time::Instant::now() + QUIET_PERIOD;
        loop {
            match tokio::time::timeout_at(deadline, self.ws.next()).await {
                Err(_) => return true,
                Ok(Some(Ok(Message::Text(text)))) => {
                    let queue_chatter = serde_json::from_str::<Value>(text.as_str())
                        .map(|v| v["type"] == "queue-update")
                        .unwrap_or(false);
                    if !queue_chatter {
                        return false;
                    }
                }
                Ok(Some(Ok(_))) => {}
                Ok(_) => return false,
            }
        }
    }

    /// Join and return the `enqueued` acknowledgment.
    pub async fn join(&mut self) -> Result<Value> {
        self.send(json!({"type": "join-queue"})).await?;
        self.expect("enqueued").await
    }

    /// Join and wait until matched. Returns `(session_id, partner_id)`.
    pub async fn join_and_match(&mut self) -> Result<(String, String)> {
        self.join().await?;
        self.matched().await
    }

    pub async fn matched(&mut self) -> Result<(String, String)> {
        let m = self.expect("matched").await?;
        Ok((
            m["session_id"].as_str().context("session_id")?.to_string(),
            m["partner_id"].as_str().context("partner_id")?.to_string(),
        ))
    }

    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}

/// Two chat clients matched with each other. Returns `(a, b, session_id)`.
pub async fn chat_pair(server: &TestServer) -> Result<(Client, Client, String)> {
    let mut a = Client::chat(server).await?;
    let mut b = Client::chat(server).await?;
    a.join().await?;
    let (sid, partner) = b.join_and_match().await?;
    assert_eq!(partner, a.id);
    let (sid_a, partner_a) = a.matched().await?;
    assert_eq!(sid_a, sid);
    assert_eq!(partner_a, b.id);
    Ok((a, b, sid))
}
