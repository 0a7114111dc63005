//! Channel manager: fans in every channel's stream and routes replies.

use futures::stream;

use crate::channels::{Channel, IncomingMessage, MessageStream};
use crate::conversation::Render;
use crate::error::ChannelError;

/// Owns the active channels.
#[derive(Default)]
pub struct ChannelManager {
    channels: Vec<Box<dyn Channel>>,
}

impl ChannelManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, channel: Box<dyn Channel>) {
        tracing::info!(channel = channel.name(), "Channel registered");
        self.channels.push(channel);
    }

    pub fn names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Start every channel and merge their streams.
    ///
    /// A channel that fails its health check or start is skipped; it is an
    /// error only if none start.
    pub async fn start_all(&self) -> Result<MessageStream, ChannelError> {
        let mut streams = Vec::new();

        for channel in &self.channels {
            if let Err(e) = channel.health_check().await {
                tracing::error!(channel = channel.name(), "Health check failed: {e}");
                continue;
            }
            match channel.start().await {
                Ok(stream) => streams.push(stream),
                Err(e) => tracing::error!(channel = channel.name(), "Failed to start: {e}"),
            }
        }

        if streams.is_empty() {
            return Err(ChannelError::StartupFailed {
                name: "all".into(),
                reason: "no channel could be started".into(),
            });
        }

        Ok(Box::pin(stream::select_all(streams)))
    }

    /// Route a render back through the channel the message came from.
    pub async fn respond(&self, msg: &IncomingMessage, render: Render) -> Result<(), ChannelError> {
        let channel = self
            .channels
            .iter()
            .find(|c| c.name() == msg.channel)
            .ok_or_else(|| ChannelError::UnknownChannel(msg.channel.clone()))?;
        channel.respond(msg, render).await
    }

    pub async fn shutdown_all(&self) -> Result<(), ChannelError> {
        for channel in &self.channels {
            if let Err(e) = channel.shutdown().await {
                tracing::warn!(channel = channel.name(), "Shutdown failed: {e}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use futures::StreamExt;

    use super::*;
    use crate::conversation::Keyboard;

    /// Emits a fixed list of messages and records replies.
    struct ScriptedChannel {
        name: String,
        script: Vec<&'static str>,
        healthy: bool,
        replies: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedChannel {
        fn new(name: &str, script: Vec<&'static str>) -> Self {
            Self {
                name: name.to_string(),
                script,
                healthy: true,
                replies: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl Channel for ScriptedChannel {
        fn name(&self) -> &str {
            &self.name
        }

        async fn start(&self) -> Result<MessageStream, ChannelError> {
            let messages: Vec<IncomingMessage> = self
                .script
                .iter()
                .map(|text| IncomingMessage::new(&self.name, "u1", text))
                .collect();
            Ok(Box::pin(stream::iter(messages)))
        }

        async fn respond(
            &self,
            _msg: &IncomingMessage,
            render: Render,
        ) -> Result<(), ChannelError> {
            self.replies.lock().unwrap().push(render.body);
            Ok(())
        }

        async fn health_check(&self) -> Result<(), ChannelError> {
            if self.healthy {
                Ok(())
            } else {
                Err(ChannelError::StartupFailed {
                    name: self.name.clone(),
                    reason: "down".into(),
                })
            }
        }

        async fn shutdown(&self) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn start_all_merges_streams() {
        let mut manager = ChannelManager::new();
        manager.add(Box::new(ScriptedChannel::new("a", vec!["one", "two"])));
        manager.add(Box::new(ScriptedChannel::new("b", vec!["three"])));

        let stream = manager.start_all().await.unwrap();
        let mut contents: Vec<String> = stream.map(|m| m.content).collect().await;
        contents.sort();
        assert_eq!(contents, vec!["one", "three", "two"]);
    }

    #[tokio::test]
    async fn start_all_skips_unhealthy_channels() {
        let mut sick = ScriptedChannel::new("sick", vec!["never"]);
        sick.healthy = false;

        let mut manager = ChannelManager::new();
        manager.add(Box::new(sick));
        manager.add(Box::new(ScriptedChannel::new("ok", vec!["hello"])));

        let stream = manager.start_all().await.unwrap();
        let contents: Vec<String> = stream.map(|m| m.content).collect().await;
        assert_eq!(contents, vec!["hello"]);
    }

    #[tokio::test]
    async fn start_all_fails_when_nothing_starts() {
        let mut sick = ScriptedChannel::new("sick", vec![]);
        sick.healthy = false;

        let mut manager = ChannelManager::new();
        manager.add(Box::new(sick));
        assert!(manager.start_all().await.is_err());
    }

    #[tokio::test]
    async fn respond_routes_by_channel_name() {
        let a = ScriptedChannel::new("a", vec![]);
        let a_replies = a.replies.clone();
        let b = ScriptedChannel::new("b", vec![]);
        let b_replies = b.replies.clone();

        let mut manager = ChannelManager::new();
        manager.add(Box::new(a));
        manager.add(Box::new(b));

        let msg = IncomingMessage::new("b", "u1", "hi");
        manager
            .respond(&msg, Render::new("u1", "reply", Keyboard::Remove))
            .await
            .unwrap();

        assert!(a_replies.lock().unwrap().is_empty());
        assert_eq!(*b_replies.lock().unwrap(), vec!["reply"]);
    }

    #[tokio::test]
    async fn respond_to_unknown_channel_errors() {
        let manager = ChannelManager::new();
        let msg = IncomingMessage::new("ghost", "u1", "hi");
        let err = manager
            .respond(&msg, Render::new("u1", "x", Keyboard::Remove))
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::UnknownChannel(name) if name == "ghost"));
    }
}
