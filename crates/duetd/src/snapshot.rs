//! Periodic broker snapshot in the daemon log.

use std::time::Duration;

use duet_core::Payload;
use duet_services::Broker;

pub async fn log_snapshot<P: Payload>(broker: &Broker<P>) {
    let snap = broker.snapshot().await;
    if !snap.consistent {
        if let Err(e) = broker.audit().await {
            tracing::error!(broker = snap.broker, error = %e, "broker state inconsistent");
        }
    }
    tracing::info!(
        broker = snap.broker,
        connected = snap.connected,
        queued = snap.queued,
        sessions = snap.active_sessions,
        created = snap.counters.sessions_created,
        ended = snap.counters.sessions_ended,
        relayed = snap.counters.relayed,
        dropped = snap.counters.dropped,
        "broker snapshot"
    );
}

/// Log every `period` until the task is dropped.
pub async fn snapshot_loop<A: Payload, B: Payload>(
    first: Option<Broker<A>>,
    second: Option<Broker<B>>,
    period: Duration,
) {
    let mut interval = tokio::time::interval(period);
    // The first tick fires immediately; skip it so startup stays quiet.
    interval.tick().await;
    loop {
        interval.tick().await;
        if let Some(b) = &first {
            log_snapshot(b).await;
        }
        if let Some(b) = &second {
            log_snapshot(b).await;
        }
    }
}
