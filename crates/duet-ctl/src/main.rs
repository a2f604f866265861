//! duet-ctl — command-line interface for the duet daemon.

use anyhow::{Context, Result};

mod cmd;

use cmd::{blocks, sessions, status};

const DEFAULT_PORT: u16 = 9001;

fn print_usage() {
    println!("Usage: duet-ctl [--port <port>] <command>");
    println!();
    println!("Commands:");
    println!("  status                   Show broker counts and health");
    println!("  sessions <broker>        List active sessions (chat or call)");
    println!("  session <broker> <id>    Inspect one session");
    println!("  blocks                   List blocked name pairs");
    println!("  block <a> <b>            Never pair these two names");
    println!("  unblock <a> <b>          Remove a blocked pair");
    println!("  shutdown                 Stop the daemon");
    println!();
    println!("Options:");
    println!("  --port <port>   Admin API port (default: {})", DEFAULT_PORT);
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Parse --port option
    let mut port = DEFAULT_PORT;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--port" {
            i += 1;
            port = args.get(i)
                .context("--port requires a value")?
                .parse()
                .context("--port must be a number")?;
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["status"] | []                 => status::cmd_status(port).await,
        ["sessions", broker]            => sessions::cmd_sessions(port, broker).await,
        ["session", broker, id]         => sessions::cmd_session(port, broker, id).await,
        ["blocks"]                      => blocks::cmd_block_list(port).await,
        ["block", a, b]                 => blocks::cmd_block(port, a, b).await,
        ["unblock", a, b]               => blocks::cmd_unblock(port, a, b).await,
        ["shutdown"]                    => status::cmd_shutdown(port).await,
        ["help"] | ["--help"] | ["-h"]  => { print_usage(); Ok(()) }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
