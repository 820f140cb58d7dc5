mod http;

use anyhow::Context;
use clap::Parser;
use hermes::{
    Bot, ChartStore, ChatCompletionsNarrator, ConversationStore, DocumentStore, MemoryStore,
    NarratorConfig, OpenMeteoResolver, Oracle, TelegramClient,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use urania::SwissEphemerisAdapter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Astrology chat backend: HTTP API and Telegram bot")]
struct Args {
    /// Config file (default: configs/oracle.toml, searched from the working directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override `http.listen` from the config.
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Serve the HTTP API only, even when Telegram is configured.
    #[arg(long, default_value_t = false)]
    no_telegram: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let settings = oracle_config::load_oracle_settings(args.config.as_deref())
        .context("loading oracle configuration")?;

    let provider = SwissEphemerisAdapter::new(
        settings.ephemeris.path.clone(),
        &settings.ephemeris.house_system,
    )
    .context("opening Swiss Ephemeris")?;

    let (charts, conversations): (Arc<dyn ChartStore>, Arc<dyn ConversationStore>) =
        match &settings.store.dir {
            Some(dir) => {
                let store = Arc::new(
                    DocumentStore::open(dir)
                        .await
                        .with_context(|| format!("opening store at {}", dir.display()))?,
                );
                (store.clone(), store)
            }
            None => {
                log::warn!("store.dir not set; charts and conversations live in memory only");
                let store = Arc::new(MemoryStore::new());
                (store.clone(), store)
            }
        };

    let narrator = ChatCompletionsNarrator::new(NarratorConfig {
        base_url: settings.llm.base_url.clone(),
        model: settings.llm.model.clone(),
        api_key: settings.llm.api_key.clone(),
        temperature: settings.llm.temperature,
        max_tokens: settings.llm.max_tokens,
        timeout: Duration::from_secs(settings.llm.timeout_secs),
    })?;
    let oracle = Arc::new(
        Oracle::new(provider, charts, conversations, Arc::new(narrator))
            .with_history_turns(settings.llm.history_turns),
    );
    let resolver = Arc::new(OpenMeteoResolver::new(
        settings.geocoding.search_url.clone(),
        settings.geocoding.timezone_url.clone(),
    )?);

    let state = Arc::new(http::ApiState {
        oracle: oracle.clone(),
        resolver: resolver.clone(),
    });
    let listen = args.listen.unwrap_or(settings.http.listen);
    let server = tokio::spawn(http::serve(listen, state, shutdown_signal()));

    match settings.telegram.filter(|_| !args.no_telegram) {
        Some(telegram) => {
            let client = TelegramClient::new(
                &telegram.api_url,
                &telegram.token,
                telegram.poll_timeout_secs,
            )?;
            let bot = Bot::new(oracle, resolver);
            tokio::select! {
                _ = bot.run(&client) => {}
                _ = shutdown_signal() => log::info!("telegram: stopping"),
            }
        }
        None => log::info!("telegram bot disabled"),
    }

    server.await.context("http server task panicked")??;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("could not listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
