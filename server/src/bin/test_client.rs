use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use log::{info, warn};
use serde_json::{json, Map};
use shared::{ClientMessage, ServerMessage};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Parser, Debug)]
#[command(author, version, about = "Scripted relay client for manual testing", long_about = None)]
struct Args {
    /// Relay URL to connect to
    #[arg(short, long, default_value = "ws://127.0.0.1:8080")]
    url: String,

    /// Number of events to fire
    #[arg(short, long, default_value = "3")]
    events: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let (socket, _) = connect_async(args.url.as_str()).await?;
    info!("Connected to {}", args.url);
    let (mut sink, mut frames) = socket.split();

    // Print everything the relay sends until the script is done
    let printer = tokio::spawn(async move {
        while let Ok(Some(frame)) = timeout(Duration::from_secs(2), frames.next()).await {
            match frame {
                Ok(Message::Text(text)) => match ServerMessage::decode(&text) {
                    Ok(message) => info!("Received {:?}", message),
                    Err(e) => warn!("Unreadable frame {:?}: {}", text, e),
                },
                Ok(_) => {}
                Err(e) => {
                    warn!("Connection error: {}", e);
                    break;
                }
            }
        }
    });

    sink.send(Message::Text(ClientMessage::Hello.encode())).await?;

    for shot in 0..args.events {
        let mut fields = Map::new();
        fields.insert("payload".to_string(), json!("fire"));
        fields.insert("shot".to_string(), json!(shot));
        sink.send(Message::Text(ClientMessage::Event(fields).encode()))
            .await?;
        sleep(Duration::from_millis(100)).await;
    }

    sink.send(Message::Text(ClientMessage::Beacon.encode())).await?;
    sink.send(Message::Text(ClientMessage::Hello.encode())).await?;

    printer.await?;
    sink.send(Message::Close(None)).await?;
    info!("Test client finished");

    Ok(())
}
