use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use leadbook::config::AppConfig;
use leadbook::routes::build_router;
use leadbook::services::clock::SystemClock;
use leadbook::services::email::resend::ResendEmailProvider;
use leadbook::services::messaging::twilio::TwilioSmsProvider;
use leadbook::services::notifications::Notifier;
use leadbook::services::reminders::run_sweep;
use leadbook::services::store::fallback::LocalFallbackStore;
use leadbook::services::store::sqlite::SqliteBookingStore;
use leadbook::services::store::BookingStore;
use leadbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let store: Option<Box<dyn BookingStore>> = if config.database_url.is_empty() {
        tracing::warn!("DATABASE_URL is empty, bookings will only be kept locally");
        None
    } else {
        tracing::info!("using booking store at {}", config.database_url);
        Some(Box::new(SqliteBookingStore::open(&config.database_url)?))
    };

    let fallback = if config.fallback_path.is_empty() {
        LocalFallbackStore::in_memory()
    } else {
        LocalFallbackStore::open(&config.fallback_path)?
    };

    if config.resend_api_key.is_empty() {
        tracing::warn!("RESEND_API_KEY not set, emails will fail to send");
    }
    let notifier = Notifier::new(
        Box::new(ResendEmailProvider::new(config.resend_api_key.clone())),
        Box::new(TwilioSmsProvider::new(
            config.twilio_account_sid.clone(),
            config.twilio_auth_token.clone(),
            config.twilio_phone_number.clone(),
        )),
        &config,
    );

    let state = Arc::new(AppState {
        store,
        fallback,
        config: config.clone(),
        notifier: Box::new(notifier),
        clock: Box::new(SystemClock::new(config.utc_offset_hours)),
    });

    if config.reminder_interval_secs > 0 && state.store.is_some() {
        let sweep_state = state.clone();
        let period = Duration::from_secs(config.reminder_interval_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if let Err(e) = run_sweep(&sweep_state, sweep_state.clock.now()).await {
                    tracing::error!(error = %e, "reminder sweep failed");
                }
            }
        });
        tracing::info!("reminder sweep every {}s", config.reminder_interval_secs);
    }

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
