//! /ws/chat and /ws/call — one WebSocket per participant.
//!
//! Each connection gets a writer task draining its [`ConnectionHandle`] and
//! a reader loop feeding decoded events to the broker. Whichever side stops
//! first ends the connection; the broker's disconnect path runs exactly once
//! on the way out.

use std::fmt::Display;
use std::pin::pin;

use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use futures::{Sink, SinkExt, Stream, StreamExt};

use duet_core::{protocol, Payload};
use duet_services::{Broker, ConnectionHandle};

use super::ApiState;

pub async fn handle_chat_ws(
    ws: WebSocketUpgrade,
    State(state): State<ApiState>,
) -> Result<Response, (StatusCode, String)> {
    let broker = state
        .chat
        .clone()
        .ok_or((StatusCode::NOT_FOUND, "chat broker disabled".to_string()))?;
    Ok(upgrade(ws, broker, state.max_frame_bytes))
}

pub async fn handle_call_ws(
    ws: WebSocketUpgrade,
    State(state): State<ApiState>,
) -> Result<Response, (StatusCode, String)> {
    let broker = state
        .call
        .clone()
        .ok_or((StatusCode::NOT_FOUND, "call broker disabled".to_string()))?;
    Ok(upgrade(ws, broker, state.max_frame_bytes))
}

fn upgrade<P: Payload>(ws: WebSocketUpgrade, broker: Broker<P>, max_frame_bytes: usize) -> Response {
    ws.max_message_size(max_frame_bytes).on_upgrade(move |socket| {
        let (sink, stream) = socket.split();
        run_connection(sink, stream, broker)
    })
}

async fn run_connection<P, Si, St, E>(sink: Si, stream: St, broker: Broker<P>)
where
    P: Payload,
    Si: Sink<Message> + Send + 'static,
    Si::Error: Display + Send,
    St: Stream<Item = Result<Message, E>> + Send,
    E: Display + Send,
{
    let (handle, mut rx) = ConnectionHandle::channel();
    let id = broker.connect(handle.clone()).await;
    let label = broker.label();

    let writer_handle = handle.clone();
    let mut writer = tokio::spawn(async move {
        let mut sink = pin!(sink);
        while let Some(event) = rx.recv().await {
            let text = match protocol::encode(&event) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(broker = label, error = %e, "failed to encode event");
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(text.into())).await {
                tracing::debug!(broker = label, participant = %id.short(), error = %e, "socket write failed");
                break;
            }
        }
        writer_handle.close();
        let _ = sink.close().await;
    });

    let mut stream = pin!(stream);
    loop {
        tokio::select! {
            _ = &mut writer => break,
            // Outbound buffer overflowed while the writer is stuck on the socket.
            _ = handle.closed() => break,
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => match protocol::decode::<P>(text.as_str()) {
                    Ok(event) => broker.handle_event(id, event).await,
                    Err(e) => {
                        tracing::warn!(
                            broker = label,
                            participant = %id.short(),
                            error = %e,
                            "ignoring malformed frame"
                        );
                    }
                },
                Some(Ok(Message::Binary(_))) => {
                    tracing::debug!(broker = label, participant = %id.short(), "ignoring binary frame");
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Ping/pong are answered by the server library.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(broker = label, participant = %id.short(), error = %e, "socket read failed");
                    break;
                }
            },
        }
    }

    handle.close();
    broker.disconnect(id).await;
    writer.abort();
}
