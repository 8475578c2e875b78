use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::AppState;
use crate::domain::ports::NotificationDispatcher;
use crate::domain::services::rsvp_service::RsvpService;
use crate::infra::notify::{log_notify_service::LogNotifyService, webhook_notify_service::WebhookNotifyService};
use crate::infra::repositories::{
    postgres_event_repo::PostgresEventRepo, postgres_job_repo::PostgresJobRepo,
    postgres_member_repo::PostgresMemberRepo, postgres_rsvp_repo::PostgresRsvpRepo,
    sqlite_event_repo::SqliteEventRepo, sqlite_job_repo::SqliteJobRepo,
    sqlite_member_repo::SqliteMemberRepo, sqlite_rsvp_repo::SqliteRsvpRepo,
};

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let notifier: Arc<dyn NotificationDispatcher> = match &config.notify_webhook_url {
        Some(url) => Arc::new(WebhookNotifyService::new(
            url.clone(),
            config.notify_webhook_token.clone(),
        )),
        None => Arc::new(LogNotifyService),
    };

    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        let event_repo = Arc::new(PostgresEventRepo::new(pool.clone()));
        let rsvp_repo = Arc::new(PostgresRsvpRepo::new(pool.clone()));
        let rsvp_service = Arc::new(RsvpService::new(event_repo.clone(), rsvp_repo.clone()));

        AppState {
            config: config.clone(),
            member_repo: Arc::new(PostgresMemberRepo::new(pool.clone())),
            event_repo,
            rsvp_repo,
            job_repo: Arc::new(PostgresJobRepo::new(pool.clone())),
            rsvp_service,
            notifier,
        }
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        let event_repo = Arc::new(SqliteEventRepo::new(pool.clone()));
        let rsvp_repo = Arc::new(SqliteRsvpRepo::new(pool.clone()));
        let rsvp_service = Arc::new(RsvpService::new(event_repo.clone(), rsvp_repo.clone()));

        AppState {
            config: config.clone(),
            member_repo: Arc::new(SqliteMemberRepo::new(pool.clone())),
            event_repo,
            rsvp_repo,
            job_repo: Arc::new(SqliteJobRepo::new(pool.clone())),
            rsvp_service,
            notifier,
        }
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
