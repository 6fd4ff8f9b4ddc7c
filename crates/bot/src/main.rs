//! `geoclock-bot` -- geofenced time-and-attendance enforcer.
//!
//! Consumes Telegram location shares, keeps each employee's current
//! location and live-session state, and periodically clocks out anyone
//! who leaves their working area, stops sharing, or goes stale.
//!
//! # Environment variables
//!
//! | Variable             | Required | Default          | Description                         |
//! |----------------------|----------|------------------|-------------------------------------|
//! | `TELEGRAM_BOT_TOKEN` | yes      | --               | Bot API token                       |
//! | `DEFAULT_TZ`         | no       | `Africa/Nairobi` | Fallback zone for displayed hours   |
//! | `WEB_APP_URL`        | no       | --               | Attendance web app linked by `/app` |
//! | `PROJECTS`           | no       | `default`        | Logical database names to register  |

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geoclock_bot::commands::CommandHandler;
use geoclock_bot::config::BotConfig;
use geoclock_bot::dispatch::UpdateDispatcher;
use geoclock_bot::ingest::LocationIngestor;
use geoclock_bot::live::{LiveSessionRegistry, LiveSessionSweeper};
use geoclock_bot::monitor::{LocationMonitor, MonitorConfig};
use geoclock_bot::notify::Notifier;
use geoclock_bot::sessions::ChatSessions;
use geoclock_bot::telegram::{self, ChatTransport, TelegramApi};
use geoclock_store::memory::MemoryDatabase;
use geoclock_store::registry::DatabaseRegistry;
use geoclock_store::Database;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geoclock_bot=info,geoclock_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(
        default_tz = %config.default_timezone,
        projects = ?config.projects,
        "Loaded configuration"
    );

    // Document-store backends are deployment-specific; the in-process
    // store keeps local runs self-contained. Production wiring swaps
    // these handles for real document-store adapters.
    let databases: Vec<Arc<dyn Database>> = config
        .projects
        .iter()
        .map(|project| Arc::new(MemoryDatabase::new(project.clone())) as Arc<dyn Database>)
        .collect();
    let databases = Arc::new(DatabaseRegistry::new(databases));

    let api = Arc::new(TelegramApi::new(&config.bot_token));
    let transport: Arc<dyn ChatTransport> = api.clone();

    let sessions = Arc::new(ChatSessions::new());
    let live = Arc::new(LiveSessionRegistry::new());

    let cancel = CancellationToken::new();

    // --- Live-session sweeper ---
    let sweeper = LiveSessionSweeper::new(Arc::clone(&live), Arc::clone(&databases));
    let sweeper_handle = tokio::spawn(sweeper.run(cancel.child_token()));

    // --- Location monitor ---
    let notifier = Arc::new(Notifier::new(Arc::clone(&transport), Arc::clone(&databases)));
    let monitor_config = MonitorConfig {
        default_timezone: config.default_timezone.clone(),
        ..MonitorConfig::default()
    };
    let monitor = Arc::new(LocationMonitor::new(
        monitor_config,
        Arc::clone(&databases),
        notifier,
    ));
    monitor.start().await;

    // --- Telegram polling ---
    let ingestor = Arc::new(LocationIngestor::new(
        Arc::clone(&databases),
        Arc::clone(&sessions),
        Arc::clone(&live),
    ));
    let commands = Arc::new(CommandHandler::new(
        Arc::clone(&transport),
        Arc::clone(&databases),
        Arc::clone(&sessions),
        config.web_app_url.clone(),
    ));
    let dispatcher = Arc::new(UpdateDispatcher::new(ingestor, commands));
    let poller_handle = tokio::spawn(telegram::poller::run(
        Arc::clone(&api),
        dispatcher,
        cancel.child_token(),
    ));

    tracing::info!("geoclock-bot started");

    shutdown_signal().await;

    // --- Graceful shutdown ---
    cancel.cancel();
    monitor.stop().await;

    let _ = tokio::time::timeout(Duration::from_secs(5), poller_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), sweeper_handle).await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM so the process stops cleanly
/// whether interrupted interactively or by a process manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
