//! Feed viewer example
//!
//! Run with: cargo run --example feed_viewer [SERVER_ADDR]
//!
//! Connects to a feed server (retrying with back-off while it is down),
//! reads length-prefixed frames, and reports what arrives. A real viewer
//! would hand each payload to a JPEG decoder; this one just counts bytes.

use std::net::SocketAddr;
use std::time::Duration;

use framecast::FeedReceiver;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:6666".to_string())
        .parse()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("framecast=debug".parse()?),
        )
        .init();

    println!("Connecting to {addr}...");
    let mut receiver =
        FeedReceiver::connect_with_backoff(addr, 10, Duration::from_millis(500)).await?;
    println!("Connected, reading frames (Ctrl-C to stop)");

    let mut frames: u64 = 0;
    loop {
        tokio::select! {
            result = receiver.next_frame() => {
                let frame = result?;
                frames += 1;
                if frames % 30 == 0 {
                    println!("{} frames received (latest {} bytes)", frames, frame.len());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\n{} frames received in total", frames);
                break;
            }
        }
    }

    Ok(())
}
