//! Gateway runner: connects to Discord, converts serenity events into [`GatewayEvent`]s and hands
//! them to the [`ThreadRouter`]. Each message is routed on its own spawned task.

use async_trait::async_trait;
use completion_client::CompletionClient;
use relay_bot::{GatewayEvent, RelayConfig, RouteOutcome, StreamingReplyEngine, ThreadRouter};
use relay_core::{RelayError, Result};
use serenity::gateway::ActivityData;
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::gateway::{GatewayIntents, Ready};
use serenity::prelude::{Client, Context, EventHandler};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use crate::adapters::DiscordMessageWrapper;
use crate::bot_adapter::DiscordBotAdapter;

/// Presence shown once the session is ready.
pub const ACTIVITY_TEXT: &str = "Chat with AI";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub fn gateway_intents() -> GatewayIntents {
    GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
}

struct RelayHandler {
    router: ThreadRouter,
}

#[async_trait]
impl EventHandler for RelayHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "Connected to Discord");
        ctx.set_activity(Some(ActivityData::playing(ACTIVITY_TEXT)));
        self.router
            .dispatch(GatewayEvent::Ready {
                bot_user_id: ready.user.id.to_string(),
            })
            .await;
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let inbound = DiscordMessageWrapper(&msg).to_inbound();
        debug!(
            channel_id = %inbound.channel_id,
            author_id = %inbound.author_id,
            message_id = %inbound.id,
            "Received message"
        );

        // Route in a spawned task so the gateway handler returns immediately.
        let router = self.router.clone();
        tokio::spawn(async move {
            if let Some(RouteOutcome::Ignored(reason)) =
                router.dispatch(GatewayEvent::MessageCreate(inbound)).await
            {
                debug!(reason = ?reason, "Message ignored");
            }
        });
    }
}

/// Builds the reply pipeline over `http` from `config`.
pub fn build_router(config: Arc<RelayConfig>, http: Arc<Http>) -> Result<ThreadRouter> {
    let bot = Arc::new(DiscordBotAdapter::new(http));
    let http_client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| RelayError::Config(format!("failed to build HTTP client: {}", e)))?;
    let engine = StreamingReplyEngine::new(bot.clone(), CompletionClient::with_http_client(http_client))
        .with_edit_interval(config.edit_interval());
    Ok(ThreadRouter::new(config, bot, engine))
}

/// Connects with `config.token` and processes events until the gateway fails or `shutdown`
/// resolves; on shutdown all shards are closed before returning.
#[instrument(skip(config, shutdown))]
pub async fn run_client<F>(config: Arc<RelayConfig>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let router = build_router(config.clone(), Arc::new(Http::new(&config.token)))?;
    info!(
        channels = config.api_channel_configs.len(),
        edit_interval_secs = config.edit_interval_secs,
        "Starting Discord client"
    );

    let mut client = Client::builder(&config.token, gateway_intents())
        .event_handler(RelayHandler { router })
        .await
        .map_err(|e| RelayError::Connection(e.to_string()))?;
    let shard_manager = client.shard_manager.clone();

    tokio::select! {
        result = client.start() => {
            result.map_err(|e| {
                error!(error = %e, "Discord gateway stopped");
                RelayError::Connection(e.to_string())
            })
        }
        _ = shutdown => {
            info!("Shutdown requested; closing shards");
            shard_manager.shutdown_all().await;
            Ok(())
        }
    }
}
