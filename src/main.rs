use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod dto;
mod error;
mod handlers;
mod models;
mod repository;
mod services;

use config::Config;
use repository::postgres::PgStore;
use repository::{LogRepository, NotificationRepository, UserRepository};
use services::daily_logs::DailyLogService;
use services::date_window::{DateWindow, SystemClock};
use services::insights::InsightsService;
use services::push::LogPushSender;
use services::reconcile::ReconcileJob;
use services::reminders::ReminderJob;
use services::text_gen::{ClaudeTextGenerator, TextGenerator};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub daily_logs: DailyLogService,
    pub insights: InsightsService,
    pub users: Arc<dyn UserRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodlog_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    // Database
    let db = db::create_pool(&config.database_url).await;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations applied");

    let store = Arc::new(PgStore::new(db.clone()));
    let logs: Arc<dyn LogRepository> = store.clone();
    let users: Arc<dyn UserRepository> = store.clone();
    let notifications: Arc<dyn NotificationRepository> = store;

    let window = DateWindow::new(config.utc_offset(), Arc::new(SystemClock));

    let text_gen: Option<Arc<dyn TextGenerator>> = if config.enrichment_enabled() {
        let generator = ClaudeTextGenerator::new(
            config.claude_api_key.clone(),
            config.claude_model.clone(),
            Duration::from_secs(config.enrichment_timeout_secs),
        )
        .expect("Failed to build text generation client");
        Some(Arc::new(generator))
    } else {
        tracing::info!("CLAUDE_API_KEY not set, log details will not be enriched");
        None
    };

    // Background jobs
    services::scheduler::spawn_reconcile_worker(
        ReconcileJob::new(
            logs.clone(),
            users.clone(),
            window.clone(),
            config.job_concurrency,
        ),
        window.clone(),
        config.reconcile_at,
    );
    services::scheduler::spawn_reminder_worker(
        ReminderJob::new(
            users.clone(),
            logs.clone(),
            notifications.clone(),
            Arc::new(LogPushSender),
            window.clone(),
            chrono::Duration::hours(config.reminder_inactive_hours),
            config.job_concurrency,
        ),
        Duration::from_secs(config.reminder_interval_secs),
    );

    let state = AppState {
        db,
        config: config.clone(),
        daily_logs: DailyLogService::new(
            logs.clone(),
            window.clone(),
            config.tracker_policy,
            text_gen,
        ),
        insights: InsightsService::new(logs, window),
        users,
        notifications,
    };

    let app = build_router(state).layer(cors_layer(&config));

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz));

    let protected_routes = Router::new()
        // Daily logs
        .route("/api/moods", get(handlers::daily_logs::list_logs))
        .route("/api/moods/log", post(handlers::daily_logs::submit_mood))
        .route(
            "/api/moods/log/:id",
            patch(handlers::daily_logs::submit_satisfaction),
        )
        .route(
            "/api/moods/log/:id/tracker",
            patch(handlers::daily_logs::update_tracker),
        )
        .route("/api/moods/weekly", get(handlers::daily_logs::weekly_logs))
        .route(
            "/api/moods/weekly/summary",
            get(handlers::daily_logs::weekly_summary),
        )
        .route("/api/moods/details", get(handlers::daily_logs::log_details))
        // Insights
        .route("/api/insights/7days", get(handlers::insights::seven_days))
        .route("/api/insights/monthly", get(handlers::insights::monthly))
        // Notifications
        .route(
            "/api/notifications",
            post(handlers::notifications::create_notification)
                .get(handlers::notifications::list_unread),
        )
        .route(
            "/api/notifications/:id",
            patch(handlers::notifications::mark_read),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let allowed_origins: Vec<axum::http::HeaderValue> = {
        let mut origins = vec![config
            .frontend_url
            .parse::<axum::http::HeaderValue>()
            .expect("FRONTEND_URL must be a valid header value")];
        // In dev, also allow LAN access (e.g. testing from another device)
        if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
            for o in extra.split(',') {
                if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                    origins.push(hv);
                }
            }
        }
        origins
    };

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PATCH,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true)
}
