//! Feed server example
//!
//! Run with: cargo run --example feed_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example feed_server                  # binds to 0.0.0.0:6666
//!   cargo run --example feed_server localhost        # binds to 127.0.0.1:6666
//!   cargo run --example feed_server 127.0.0.1:7000   # binds to 127.0.0.1:7000
//!
//! Streams a looping set of synthetic JPEG payloads; the producer only runs
//! while at least one viewer is connected. Watch with:
//!   cargo run --example feed_viewer 127.0.0.1:6666

use std::net::SocketAddr;

use bytes::Bytes;
use framecast::{FeedServer, ReplayFeed, ServerConfig, SourceConfig};

/// Parse bind address from command line argument.
///
/// Accepts "localhost", an IP, or IP:PORT.
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 6666;

    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

/// Build a handful of recognizable fake JPEG frames.
///
/// Each payload carries the JPEG start/end markers and a distinct body so a
/// viewer can tell the frames apart.
fn synthetic_frames() -> Vec<Bytes> {
    (0u8..8)
        .map(|i| {
            let mut frame = vec![0xFF, 0xD8];
            frame.extend(std::iter::repeat(i).take(16 * 1024));
            frame.extend([0xFF, 0xD9]);
            Bytes::from(frame)
        })
        .collect()
}

fn print_usage() {
    eprintln!("Usage: feed_server [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:6666)");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let bind_addr = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => "0.0.0.0:6666".parse().unwrap(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("framecast=debug".parse()?)
                .add_directive("feed_server=info".parse()?),
        )
        .init();

    let config = ServerConfig::default()
        .bind(bind_addr)
        .source(SourceConfig::default().source("synthetic").fps(30));

    println!("Starting feed server on {}", config.bind_addr);
    println!("Connect a viewer: cargo run --example feed_viewer -- {}", bind_addr);
    println!();

    let server = FeedServer::new(config, ReplayFeed::new(synthetic_frames()))?;
    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nShutting down...");
        })
        .await?;

    Ok(())
}
