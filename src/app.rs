//! Main loop: feeds channel messages through the conversation engine.
//!
//! Messages are handled strictly one at a time. Idle pruning shares the same
//! `select!`, so it never overlaps a transition.

use std::time::Duration;

use futures::StreamExt;

use crate::channels::{ChannelManager, IncomingMessage};
use crate::conversation::{ConversationEngine, InboundEvent, Render};
use crate::error::Error;
use crate::menu;

/// Loop settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub session_idle_timeout: Duration,
    pub prune_interval: Duration,
}

/// Ties channels to the engine.
pub struct App {
    config: AppConfig,
    engine: ConversationEngine,
    channels: ChannelManager,
}

impl App {
    pub fn new(config: AppConfig, engine: ConversationEngine, channels: ChannelManager) -> Self {
        Self {
            config,
            engine,
            channels,
        }
    }

    /// Handle one message and return the render to send back.
    pub fn process(&mut self, message: &IncomingMessage) -> Render {
        self.engine.handle(to_event(message))
    }

    /// Run until Ctrl+C or until every channel stream ends.
    pub async fn run(mut self) -> Result<(), Error> {
        let mut message_stream = self.channels.start_all().await?;

        let mut prune_tick = tokio::time::interval(self.config.prune_interval);
        prune_tick.tick().await; // Skip immediate first tick

        tracing::info!(channels = ?self.channels.names(), "Pizza assistant ready and listening");

        loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break;
                }
                _ = prune_tick.tick() => {
                    self.engine.prune_idle(self.config.session_idle_timeout);
                    continue;
                }
                msg = message_stream.next() => {
                    match msg {
                        Some(m) => m,
                        None => {
                            tracing::info!("All channel streams ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            let render = self.process(&message);
            if let Err(e) = self.channels.respond(&message, render).await {
                tracing::warn!(
                    channel = %message.channel,
                    user_id = %message.user_id,
                    "Failed to deliver response: {e}"
                );
            }
        }

        tracing::info!("Pizza assistant shutting down...");
        self.channels.shutdown_all().await?;
        Ok(())
    }
}

/// Translate a transport message into an engine event.
pub fn to_event(message: &IncomingMessage) -> InboundEvent {
    let event = InboundEvent::new(message.user_id.clone(), menu::parse_input(&message.content));
    match &message.user_name {
        Some(name) => event.with_display_name(name.clone()),
        None => event,
    }
}
