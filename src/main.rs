use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use push_relay_service::config::{LogFormat, LoggingConfig, Settings};
use push_relay_service::message::{Message, MessageRequest};
use push_relay_service::relay::{MemoryRegistry, MemoryRelay};
use push_relay_service::service::Messages;

/// Encode a message request read from stdin.
///
/// Without arguments the relay envelope is printed. With an endpoint ARN the
/// full publish request for that endpoint is printed instead (or only logged
/// when `push.debug` is set).
#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing
    init_tracing(&settings.logging);
    tracing::debug!("Configuration loaded");

    let mut body = String::new();
    std::io::stdin()
        .read_to_string(&mut body)
        .context("Failed to read message from stdin")?;

    let request: MessageRequest =
        serde_json::from_str(&body).context("Invalid message request body")?;
    let message = Message::from(request);

    match std::env::args().nth(1) {
        Some(endpoint_arn) => publish(settings, &message, &endpoint_arn).await,
        None => {
            let envelope = match message.serialize() {
                Ok(envelope) => envelope,
                Err(e) => {
                    tracing::error!(platform = %e.platform(), error = %e, "Message rejected");
                    return Err(e.into());
                }
            };

            tracing::info!(
                channels = envelope.len(),
                push_type = %message.push_type(),
                collapse_key = %message.collapse_key(),
                "Message encoded"
            );
            println!("{}", envelope.to_json());
            Ok(())
        }
    }
}

async fn publish(settings: Settings, message: &Message, endpoint_arn: &str) -> Result<()> {
    let relay = Arc::new(MemoryRelay::new());
    let messages = Messages::new(relay.clone(), Arc::new(MemoryRegistry::new()), settings.push);

    if let Err(e) = messages.send(message, endpoint_arn).await {
        tracing::error!(code = e.code(), error = %e, "Send failed");
        return Err(e.into());
    }

    for request in relay.published_to(endpoint_arn) {
        println!("{}", serde_json::to_string_pretty(&request)?);
    }
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    // Logs go to stderr so stdout carries only the encoded output
    let registry = tracing_subscriber::registry().with(env_filter);
    match logging.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}
