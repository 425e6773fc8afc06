use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use usher_channel::{ChannelRunner, NoopChannelTransport, ReconnectPolicy};
use usher_core::config::{AppConfig, ConfigError, LoadOptions, NluProvider};
use usher_core::{DialogEngine, IntentClassifier, NotificationSink, TurnDispatcher};
use usher_db::{connect_with_settings, migrations, DbPool};
use usher_db::{SqlAttendeeDirectory, SqlQuestionInbox, SqlSessionStore};
use usher_nlu::{KeywordClassifier, UnconfiguredClassifier};

use crate::notify::{DisabledNotificationSink, WebhookNotifier};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub dispatcher: Arc<TurnDispatcher>,
    pub channel_runner: ChannelRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        session_key = "unknown",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        session_key = "unknown",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        session_key = "unknown",
        "database migrations applied"
    );

    let classifier: Arc<dyn IntentClassifier> = match config.nlu.provider {
        NluProvider::Keyword => Arc::new(KeywordClassifier::new()),
        NluProvider::Disabled => Arc::new(UnconfiguredClassifier),
    };

    let notifications: Arc<dyn NotificationSink> = match &config.notifications.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(
            url.clone(),
            config.notifications.sender.clone(),
            config.notifications.recipient.clone(),
        )),
        None => Arc::new(DisabledNotificationSink),
    };

    let dispatcher = Arc::new(TurnDispatcher::new(
        DialogEngine::new(config.event.clone(), config.nlu.min_confidence),
        classifier,
        Arc::new(SqlSessionStore::new(db_pool.clone())),
        Arc::new(SqlAttendeeDirectory::new(db_pool.clone())),
        Arc::new(SqlQuestionInbox::new(db_pool.clone())),
        notifications,
    ));

    let channel_runner = ChannelRunner::new(
        Arc::new(NoopChannelTransport),
        dispatcher.clone(),
        ReconnectPolicy::default(),
    );

    Ok(Application { config, db_pool, dispatcher, channel_runner })
}
