//! Session inspection commands.

use anyhow::Result;
use serde::Deserialize;

use super::http::{base_url, get_json};

#[derive(Deserialize)]
struct SessionsResponse {
    broker:   String,
    sessions: Vec<SessionInfo>,
}

#[derive(Deserialize)]
struct SessionInfo {
    session_id:       String,
    members:          [String; 2],
    member_names:     [Option<String>; 2],
    established_secs: u64,
}

fn member_label(id: &str, name: &Option<String>) -> String {
    match name {
        Some(n) => format!("{} ({})", &id[..8.min(id.len())], n),
        None => id[..8.min(id.len())].to_string(),
    }
}

fn print_session(s: &SessionInfo) {
    println!("  ┌─ {}", s.session_id);
    println!("  │  a      : {}", member_label(&s.members[0], &s.member_names[0]));
    println!("  │  b      : {}", member_label(&s.members[1], &s.member_names[1]));
    println!("  └─ uptime : {}s", s.established_secs);
}

pub async fn cmd_sessions(port: u16, broker: &str) -> Result<()> {
    let resp: SessionsResponse =
        get_json(&format!("{}/brokers/{}/sessions", base_url(port), broker)).await?;

    if resp.sessions.is_empty() {
        println!("No active {} sessions.", resp.broker);
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  {} sessions ({})", resp.broker, resp.sessions.len());
    println!("═══════════════════════════════════════");

    for s in &resp.sessions {
        print_session(s);
    }

    Ok(())
}

pub async fn cmd_session(port: u16, broker: &str, session_id: &str) -> Result<()> {
    let s: SessionInfo = get_json(&format!(
        "{}/brokers/{}/sessions/{}",
        base_url(port),
        broker,
        session_id
    ))
    .await?;

    print_session(&s);
    Ok(())
}
