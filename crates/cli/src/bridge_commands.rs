use std::sync::Arc;

use {
    anyhow::{Context, Result},
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use {
    ragbridge_assistant::{AssistantClient, Dispatcher, SessionIds, provision::provision},
    ragbridge_config::{AssistantConfig, RagbridgeConfig},
    ragbridge_routing::{Router, RouterConfig},
    ragbridge_telegram::{TelegramOutbound, connect, inbound_messages},
};

async fn open_session(config: &AssistantConfig) -> Result<(AssistantClient, SessionIds)> {
    let client = AssistantClient::from_config(config)?;
    let session = provision(&client, config)
        .await
        .context("failed to provision assistant resources")?;
    info!(
        assistant_id = %session.assistant_id,
        vector_store_id = %session.vector_store_id,
        "assistant session ready"
    );
    Ok((client, session))
}

/// `ragbridge run`: provision, connect the bot, and answer messages until
/// Ctrl-C.
pub async fn run(config: RagbridgeConfig) -> Result<()> {
    let (client, session) = open_session(&config.assistant).await?;
    let dispatcher = Dispatcher::new(client, session);

    let bot = connect(&config.telegram)
        .await
        .context("failed to connect telegram bot")?;
    let outbound = Arc::new(TelegramOutbound::new(bot.clone()));
    let router = Router::new(
        Arc::new(dispatcher),
        outbound,
        RouterConfig::from_config(&config.dispatch, &config.replies),
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown requested"),
            Err(e) => warn!(error = %e, "failed to listen for ctrl-c, stopping"),
        }
        on_signal.cancel();
    });

    let feed = inbound_messages(bot, config.telegram.poll_timeout_secs, cancel);
    let handled = router.run(feed).await;
    info!(handled, "ragbridge stopped");
    Ok(())
}

/// `ragbridge provision`: create (or confirm) the assistant resources and
/// print their ids for reuse in the config.
pub async fn provision_only(config: RagbridgeConfig) -> Result<()> {
    let (_, session) = open_session(&config.assistant).await?;
    println!("assistant_id = \"{}\"", session.assistant_id);
    println!("vector_store_id = \"{}\"", session.vector_store_id);
    Ok(())
}

/// `ragbridge ask`: answer a single query and print it.
pub async fn ask(config: RagbridgeConfig, message: &str) -> Result<()> {
    let (client, session) = open_session(&config.assistant).await?;
    let answer = Dispatcher::new(client, session)
        .answer(message)
        .await
        .context("assistant query failed")?;
    println!("{answer}");
    Ok(())
}
