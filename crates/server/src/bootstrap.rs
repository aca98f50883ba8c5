use std::sync::Arc;

use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::info;

use tallerbot_agent::{
    AnthropicProvider, ChatProvider, ConversationGateway, OpenAiProvider, Orchestrator,
    StaticProviderFactory, ToolRouter,
};
use tallerbot_core::config::{AppConfig, ConfigError, LoadOptions};
use tallerbot_db::repositories::{
    MessageRepository, SqlAgentConfigRepository, SqlAppointmentRepository,
    SqlConversationRepository, SqlCustomerRepository, SqlMessageRepository,
};
use tallerbot_db::{connect_with_settings, migrations, DbPool};
use tallerbot_whatsapp::outbound::{
    MessageTransport, MetaCloudTransport, NoopTransport, OutboundDispatcher, TwilioTransport,
};

const TWILIO_BASE_URL: &str = "https://api.twilio.com";
const META_BASE_URL: &str = "https://graph.facebook.com/v20.0";

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub orchestrator: Arc<Orchestrator>,
    pub messages: Arc<dyn MessageRepository>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("http client initialization failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
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
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.llm.timeout_secs))
        .build()
        .map_err(BootstrapError::HttpClient)?;

    // A vendor without a key stays unwired; tenants naming it fail their
    // turn as a configuration error instead of reaching the vendor API.
    let openai = config.llm.openai_api_key.as_ref().map(|key| {
        Arc::new(OpenAiProvider::new(
            http.clone(),
            config.llm.openai_base_url.clone(),
            key.expose_secret().to_string(),
        )) as Arc<dyn ChatProvider>
    });
    let anthropic = config.llm.anthropic_api_key.as_ref().map(|key| {
        Arc::new(AnthropicProvider::new(
            http.clone(),
            config.llm.anthropic_base_url.clone(),
            key.expose_secret().to_string(),
        )) as Arc<dyn ChatProvider>
    });
    info!(
        event_name = "system.bootstrap.llm_providers",
        correlation_id = "bootstrap",
        openai = openai.is_some(),
        anthropic = anthropic.is_some(),
        "llm providers wired from configured credentials"
    );
    let providers = Arc::new(StaticProviderFactory::new(openai, anthropic));

    let twilio: Arc<dyn MessageTransport> = match (
        config.whatsapp.twilio_account_sid.as_ref(),
        config.whatsapp.twilio_auth_token.as_ref(),
        config.whatsapp.twilio_from_phone.as_ref(),
    ) {
        (Some(sid), Some(token), Some(from)) => Arc::new(TwilioTransport::new(
            http.clone(),
            TWILIO_BASE_URL,
            sid.clone(),
            token.expose_secret().to_string(),
            from.clone(),
        )),
        _ => Arc::new(NoopTransport),
    };
    let meta: Arc<dyn MessageTransport> = match (
        config.whatsapp.meta_access_token.as_ref(),
        config.whatsapp.meta_phone_number_id.as_ref(),
    ) {
        (Some(token), Some(phone_number_id)) => Arc::new(MetaCloudTransport::new(
            http,
            META_BASE_URL,
            token.expose_secret().to_string(),
            phone_number_id.clone(),
        )),
        _ => Arc::new(NoopTransport),
    };

    let messages: Arc<dyn MessageRepository> =
        Arc::new(SqlMessageRepository::new(db_pool.clone()));
    let gateway = ConversationGateway::new(
        Arc::new(SqlCustomerRepository::new(db_pool.clone())),
        Arc::new(SqlConversationRepository::new(db_pool.clone())),
        messages.clone(),
    );
    let dispatcher = OutboundDispatcher::new(twilio, meta, messages.clone());
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(SqlAgentConfigRepository::new(db_pool.clone())),
        gateway,
        providers,
        ToolRouter::new(Arc::new(SqlAppointmentRepository::new(db_pool.clone()))),
        dispatcher,
    ));

    Ok(Application { config, db_pool, orchestrator, messages })
}

#[cfg(test)]
mod tests {
    use tallerbot_core::config::{ConfigOverrides, LoadOptions};

    use super::bootstrap;

    #[tokio::test]
    async fn bootstrap_applies_migrations_on_an_empty_database() {
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:?cache=shared".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await
        .expect("bootstrap");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
             ('customer', 'conversation', 'message', 'appointment', 'tenant_agent_config')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("schema query");
        assert_eq!(table_count, 5);

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_rejects_non_sqlite_database_urls() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("postgres://localhost/tallerbot".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;
        assert!(result.is_err());
    }
}
