use assetdesk::config::{get_config, CliArgs, Config};
use assetdesk::{create_app, cron, db, AppState};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Sets up logging to stdout, plus daily rolling JSON files when a log
/// directory is configured
///
/// The returned guard flushes the file writer and must live as long as the
/// server.
fn init_logging(config: &Config, debug: bool) -> Option<WorkerGuard> {
    let default_level = if debug { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("assetdesk={},tower_http={}", default_level, default_level)));

    let (file_layer, guard) = match &config.log_directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "assetdesk.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().json().with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    if std::fs::metadata(".env").is_ok() {
        dotenv::dotenv().ok();
    }

    let args = CliArgs::parse();
    let debug = args.debug;
    let loaded = get_config(args);
    let config = loaded.config;
    let _guard = init_logging(&config, debug);

    // Config is read before logging exists, so its problems are reported now
    for warning in &loaded.warnings {
        warn!("{}", warning);
    }

    info!(
        database_url = %config.database_url,
        bind_address = %config.bind_address,
        session_ttl_hours = config.session_ttl_hours,
        notification_poll_seconds = config.notification_poll_seconds,
        cron_interval_minutes = config.cron_interval_minutes,
        reminder_window_days = config.reminder_window_days,
        "Starting assetdesk"
    );

    // Initialize the database pool and bring the schema up to date
    let pool = Arc::new(db::init_pool(&config.database_url)?);
    {
        let mut conn = pool.get()?;
        db::run_migrations(&mut conn)?;
    }

    let sweeper = cron::spawn_sweeper(pool.clone(), &config);

    let bind_address = config.bind_address.clone();
    let app = create_app(AppState::new(pool, config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on {}", bind_address);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }

    if let Some(handle) = sweeper {
        handle.abort();
    }
    Ok(())
}
