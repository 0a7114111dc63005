//! CLI channel: stdin/stdout for local testing.
//!
//! Type a selector token (`create_order`, `thin`, `cheese`, ...), a button
//! label, or `/start`.

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::channels::{Channel, IncomingMessage, MessageStream};
use crate::conversation::{Keyboard, Render};
use crate::error::ChannelError;
use crate::menu;

/// Identifier used for the single local user.
pub const CLI_USER_ID: &str = "local-user";

/// A simple CLI channel that reads from stdin and writes to stdout.
#[derive(Default)]
pub struct CliChannel;

impl CliChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        let msg = IncomingMessage::new("cli", CLI_USER_ID, &line);
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(&self, _msg: &IncomingMessage, render: Render) -> Result<(), ChannelError> {
        println!("\n{}\n", render.body);
        if let Some(options) = format_options(&render.keyboard) {
            println!("{options}");
        }
        eprint!("> ");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}

/// One line per keyboard row: `label [token]`.
fn format_options(keyboard: &Keyboard) -> Option<String> {
    let Keyboard::Selectors(rows) = keyboard else {
        return None;
    };

    let lines: Vec<String> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|s| format!("{} [{}]", menu::label(*s), s.token()))
                .collect::<Vec<_>>()
                .join("   ")
        })
        .collect();
    Some(lines.join("\n"))
}
