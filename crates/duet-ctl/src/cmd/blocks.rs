//! Block list commands.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::http::{base_url, get_json, post_json_body};

#[derive(Serialize, Deserialize)]
struct BlockedPair {
    a: String,
    b: String,
}

#[derive(Deserialize)]
struct BlockListResponse {
    enabled: bool,
    pairs:   Vec<BlockedPair>,
}

#[derive(Deserialize)]
struct BlockAddResponse {
    a:     String,
    b:     String,
    added: bool,
}

#[derive(Deserialize)]
struct BlockRemoveResponse {
    a:       String,
    b:       String,
    removed: bool,
    matched: usize,
}

pub async fn cmd_block_list(port: u16) -> Result<()> {
    let resp: BlockListResponse = get_json(&format!("{}/blocks", base_url(port))).await?;

    if !resp.enabled {
        println!("Block list is disabled in config; entries below are not enforced.");
    }
    if resp.pairs.is_empty() {
        println!("No blocked pairs.");
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Blocked Pairs ({})", resp.pairs.len());
    println!("═══════════════════════════════════════");

    for p in &resp.pairs {
        println!("  ✗ {} ↔ {}", p.a, p.b);
    }

    Ok(())
}

pub async fn cmd_block(port: u16, a: &str, b: &str) -> Result<()> {
    let req = BlockedPair {
        a: a.to_string(),
        b: b.to_string(),
    };
    let resp: BlockAddResponse =
        post_json_body(&format!("{}/blocks/add", base_url(port)), &req).await?;

    if resp.added {
        println!("✓ Blocked {} ↔ {}", resp.a, resp.b);
    } else {
        println!("{} ↔ {} was already blocked.", resp.a, resp.b);
    }
    Ok(())
}

pub async fn cmd_unblock(port: u16, a: &str, b: &str) -> Result<()> {
    let req = BlockedPair {
        a: a.to_string(),
        b: b.to_string(),
    };
    let resp: BlockRemoveResponse =
        post_json_body(&format!("{}/blocks/remove", base_url(port)), &req).await?;

    if !resp.removed {
        println!("{} ↔ {} was not blocked.", resp.a, resp.b);
        return Ok(());
    }
    println!("✓ Unblocked {} ↔ {}", resp.a, resp.b);
    if resp.matched > 0 {
        println!("  {} waiting pair(s) matched.", resp.matched);
    }
    Ok(())
}
