mod action;
mod app;
mod app_state;
mod component;
mod components;
mod focus;
mod markdown;
mod theme;
mod widgets;
mod workspace;

use digest_proto::config::Config;
use digest_proto::BackendClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = digest_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = digest_proto::platform::log_path();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("digest log: {}", log_path.display());

    tracing::info!("digest starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(
            "[config] {} unusable ({}), using defaults",
            Config::config_path().display(),
            e
        );
        Config::default()
    });
    config.apply_env_overrides();
    if config.backend.base_url.is_empty() {
        tracing::warn!("[config] backend.base_url is empty; requests will fail");
    }

    // ── Backend client ───────────────────────────────────────────────────────
    let client = BackendClient::new(&config.backend.base_url, config.backend.request_timeout())?;

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(client, config, log_path);
    app.run().await?;

    Ok(())
}
