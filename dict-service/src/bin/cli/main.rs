use std::sync::Arc;

use clap::Parser;
use dict_service::config::Config;
use dict_service::domain::identity::reset::PasswordResetService;
use dict_service::domain::identity::service::IdentityService;
use dict_service::domain::lexicon::service::LexiconService;
use dict_service::inbound::cli::App;
use dict_service::inbound::cli::Cli;
use dict_service::outbound::email::TracingCodeSender;
use dict_service::repositories::PostgresIdentityRepository;
use dict_service::repositories::PostgresLexiconRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dict_service=info,auth=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::debug!(database = "postgresql", "Connected and migrated");

    let codec = Arc::new(auth::TokenCodec::from_pem_files(
        &config.keys.private_key_path,
        &config.keys.public_key_path,
        config.keys.passphrase.as_deref(),
    )?);
    let token_service = auth::TokenService::new(Arc::clone(&codec), config.token.ttl_seconds);
    let password_hasher = auth::PasswordHasher::with_params(
        config.password.memory_kib,
        config.password.iterations,
        config.password.parallelism,
    )?;

    let identity_repository = Arc::new(PostgresIdentityRepository::new(pg_pool.clone()));
    let lexicon_repository = Arc::new(PostgresLexiconRepository::new(pg_pool));

    let app = App {
        identities: IdentityService::new(
            Arc::clone(&identity_repository),
            token_service.clone(),
            password_hasher.clone(),
        ),
        resets: PasswordResetService::new(
            identity_repository,
            Arc::new(TracingCodeSender),
            password_hasher,
            token_service,
        ),
        lexicon: LexiconService::new(lexicon_repository, &codec),
    };

    dict_service::inbound::cli::run(&app, cli).await
}
