//! Daemon status and shutdown commands.

use anyhow::Result;
use serde::Deserialize;

use super::http::{base_url, get_json, post_json};

#[derive(Deserialize)]
struct StatusResponse {
    uptime_secs:        u64,
    brokers:            Vec<BrokerSnapshot>,
    block_list_enabled: bool,
    blocked_pairs:      usize,
}

#[derive(Deserialize)]
struct BrokerSnapshot {
    broker:           String,
    connected:        usize,
    idle:             usize,
    queued:           usize,
    paired:           usize,
    active_sessions:  usize,
    sessions_created: u64,
    sessions_ended:   u64,
    relayed:          u64,
    dropped:          u64,
    consistent:       bool,
}

#[derive(Deserialize)]
struct ShutdownResponse {
    message: String,
}

pub async fn cmd_status(port: u16) -> Result<()> {
    let resp: StatusResponse = get_json(&format!("{}/status", base_url(port))).await?;

    println!("═══════════════════════════════════════");
    println!("  Duet Daemon Status");
    println!("═══════════════════════════════════════");
    println!("  Uptime       : {}s", resp.uptime_secs);
    println!(
        "  Block list   : {} ({} pairs)",
        if resp.block_list_enabled { "on" } else { "off" },
        resp.blocked_pairs
    );

    if resp.brokers.is_empty() {
        println!("\n  No brokers enabled.");
        return Ok(());
    }

    for b in &resp.brokers {
        println!();
        println!("  ┌─ {}", b.broker);
        println!(
            "  │  connected : {} (idle {}, queued {}, paired {})",
            b.connected, b.idle, b.queued, b.paired
        );
        println!("  │  sessions  : {} active", b.active_sessions);
        println!(
            "  │  totals    : {} created, {} ended",
            b.sessions_created, b.sessions_ended
        );
        println!("  │  relay     : {} forwarded, {} dropped", b.relayed, b.dropped);
        println!(
            "  └─ state     : {}",
            if b.consistent { "consistent" } else { "INCONSISTENT" }
        );
    }

    Ok(())
}

pub async fn cmd_shutdown(port: u16) -> Result<()> {
    let resp: ShutdownResponse = post_json(&format!("{}/daemon/shutdown", base_url(port))).await?;
    println!("{}", resp.message);
    Ok(())
}
