use std::sync::Arc;

use pizza_assist::app::{App, AppConfig};
use pizza_assist::channels::{ChannelManager, CliChannel, TelegramChannel};
use pizza_assist::config::BotConfig;
use pizza_assist::conversation::ConversationEngine;
use pizza_assist::enrichment::{Enricher, HttpResolver};
use pizza_assist::store::UserRecordStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env()?;

    eprintln!("🍕 Pizza Assist v{}", env!("CARGO_PKG_VERSION"));

    // ── Record store ────────────────────────────────────────────────────
    let store = Arc::new(UserRecordStore::new(config.data_file.clone()));
    let records = store.initialize().await?;
    eprintln!("   Records: {} ({})", records, config.data_file.display());

    // ── Enrichment ──────────────────────────────────────────────────────
    let resolver = Arc::new(HttpResolver::new(config.ip_api_url.clone()));
    eprintln!(
        "   Enrichment: {} ({} attempts, {}s timeout)",
        resolver.url(),
        config.retry.max_attempts,
        config.retry.attempt_timeout.as_secs()
    );
    let enricher = Enricher::new(resolver, Arc::clone(&store), config.retry.clone());
    let engine = ConversationEngine::new(Arc::new(enricher));

    // ── Channels ────────────────────────────────────────────────────────
    let mut channels = ChannelManager::new();
    channels.add(Box::new(CliChannel::new()));

    if let Some(telegram) = config.telegram.clone() {
        eprintln!(
            "   Telegram: enabled (allowed: {})",
            if telegram.allowed_users.iter().any(|u| u == "*") {
                "everyone".to_string()
            } else {
                telegram.allowed_users.join(", ")
            }
        );
        channels.add(Box::new(TelegramChannel::new(
            telegram.bot_token,
            telegram.allowed_users,
        )));
    }

    eprintln!("   Channels: {}\n", channels.names().join(", "));
    eprintln!("   Type /start and press Enter.\n");

    let app_config = AppConfig {
        session_idle_timeout: config.session_idle_timeout,
        prune_interval: config.prune_interval,
    };
    App::new(app_config, engine, channels).run().await?;

    Ok(())
}
