use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use younote::controller::SUMMARIZE_FIRST_NOTICE;
use younote::terminal::{Command, TerminalView};
use std::path::PathBuf;
use younote::{
    ClientConfig, FileStore, KeyValueStore, MemoryStore, PageController, PageView, SubmitSource, YouNoteClient,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging()?;

    let config = ClientConfig::from_env()?;
    tracing::info!(
        base_url = %config.base_url,
        timeout_secs = config.summarize_timeout.as_secs(),
        state_dir = %config.state_dir.display(),
        "Configuration loaded"
    );

    let client = Arc::new(YouNoteClient::new(config.base_url.clone())?);
    match client.health().await {
        Ok(status) => tracing::info!("YouNote server health: {}", status),
        Err(e) => tracing::warn!("YouNote server at {} is not reachable yet: {}", client.base_url(), e),
    }

    let local_store = open_store(config.local_store_path());
    let session_store = open_store(config.session_store_path());

    let view = Arc::new(TerminalView::new(std::io::stdout()));
    let controller = PageController::new(
        client.clone(),
        view.clone(),
        local_store,
        session_store,
        &config,
    );

    controller.start();
    view.print_help();
    view.prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Search(query) => {
                controller.submit_search(&query, SubmitSource::EnterKey);
            }
            Command::Chat(question) => {
                controller.send_chat(&question);
            }
            Command::Theme => {
                controller.toggle_theme();
            }
            Command::Language(language) => controller.toggle_language(language),
            Command::Audio => match controller.current_video_id() {
                Some(video_id) => {
                    let client = client.clone();
                    let view = view.clone();
                    view.print_line(&format!("Audio overview page: {}", client.audio_overview_url(&video_id)));
                    tokio::spawn(async move {
                        match client.generate_audio(&video_id).await {
                            Ok(path) => view.print_line(&format!("Audio ready: {}{}", client.base_url(), path)),
                            Err(e) => view.show_message(&e.user_message()),
                        }
                    });
                }
                None => view.notify(SUMMARIZE_FIRST_NOTICE),
            },
            Command::Help => view.print_help(),
            Command::Quit => break,
            Command::Invalid(message) => view.print_line(&message),
        }
        view.prompt();
    }

    tracing::info!("👋 YouNote session closed");
    Ok(())
}

/// File-backed store, or an in-memory one when the file cannot be read
fn open_store(path: PathBuf) -> Arc<dyn KeyValueStore> {
    match FileStore::open(&path) {
        Ok(store) => {
            tracing::debug!(path = %store.path().display(), "State store ready");
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "State store unavailable, keeping state in memory: {}", e);
            Arc::new(MemoryStore::new())
        }
    }
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Get log level from environment or default to a quiet level for the terminal
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "warn,younote=debug,reqwest=info,hyper=info".to_string()
        } else {
            "warn,younote=info,reqwest=warn,hyper=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    // stdout belongs to the page view, logs go to stderr
    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!("🎬 YouNote starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Log level: {}", log_level);
    Ok(())
}
