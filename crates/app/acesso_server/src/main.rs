//! Acesso authorization server binary.
//!
//! Serves the authorize/validate API and carries the administrative
//! commands (migrations, application registration, user import).

pub use self::error::{Error, Result};
mod error;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use acesso_api::config::ApiConfig;
use acesso_core::auth::{AuthError, credentials, ledger};
use acesso_core::config::FlowConfig;
use acesso_core::models::auth::Application;
use acesso_core::models::user::UserImport;
use acesso_core::store::AcessoStore;
use acesso_core::store::postgres::PgStore;
use acesso_core::users;
use clap::Parser;
use cli::{Cli, Commands, RegisterAppArgs, ServeArgs};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod cli;

const DEFAULT_LOG_FILTER: &str = "info,acesso_api=debug,acesso_core=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries command output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    if let Err(e) = run(Cli::parse()).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
        Commands::Migrate => {
            let pool = connect(&cli.database_url, cli.max_connections).await?;
            info!("running database migrations");
            acesso_core::migrate::migrate(&pool).await?;
            info!("migrations applied");
        }
        Commands::ImportUsers { file } => {
            let records = read_imports(&file)?;
            let pool = connect(&cli.database_url, cli.max_connections).await?;
            let store = PgStore::new(pool);
            import_users(&store, records).await?;
        }
        Commands::RegisterApp(args) => {
            let pool = connect(&cli.database_url, cli.max_connections).await?;
            let store = PgStore::new(pool);
            register_app(&store, &args).await?;
        }
        Commands::Serve(args) => {
            let pool = connect(&cli.database_url, cli.max_connections).await?;
            info!("running database migrations");
            acesso_core::migrate::migrate(&pool).await?;
            serve(pool, cli.database_url, args).await?;
        }
    }
    Ok(())
}

async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool> {
    info!(max_connections, "configuring connection pool");
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(database_url)
        .await?;
    Ok(pool)
}

async fn serve(pool: PgPool, database_url: String, args: ServeArgs) -> Result<()> {
    let config = ApiConfig {
        bind_addr: args.bind_addr,
        pg_connection_url: database_url,
        url_path_prefix: args.url_path_prefix,
        remote_user_header: args.remote_user_header.to_ascii_lowercase(),
        flow: FlowConfig {
            check_referer: args.check_referer,
            single_use_transactions: args.single_use_transactions,
            transaction_expiry: args.transaction_expiry,
        },
    };
    info!(
        prefix = %config.url_path_prefix,
        check_referer = config.flow.check_referer,
        single_use = config.flow.single_use_transactions,
        expiry = %config.flow.transaction_expiry,
        "starting acesso_server"
    );

    let store: Arc<dyn AcessoStore> = Arc::new(PgStore::new(pool));
    let shutdown = CancellationToken::new();
    let purge = ledger::spawn_purge_task(store.clone(), shutdown.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    let app = acesso_api::router(acesso_api::AppState { store, config });

    info!(addr = %local_addr, "REST API listening");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown({
            let shutdown = shutdown.clone();
            async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("interrupt received, shutting down"),
                    _ = shutdown.cancelled() => {}
                }
            }
        })
        .await;

    shutdown.cancel();
    join_purge_task(purge).await;

    result?;
    Ok(())
}

/// Wait for the purge task, reporting a panic or cancellation.
async fn join_purge_task(handle: tokio::task::JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "transaction purge task ended abnormally");
            false
        }
    }
}

fn read_imports(path: &Path) -> Result<Vec<UserImport>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

async fn import_users(store: &dyn AcessoStore, records: Vec<UserImport>) -> Result<()> {
    let total = records.len();
    let mut imported = 0usize;
    for record in records {
        let username = record.username.clone();
        match users::save(store, record).await {
            Ok(_) => imported += 1,
            Err(AuthError::ValidationError(reason)) => {
                warn!(username = %username, reason = %reason, "skipping user record");
            }
            Err(e) => return Err(e.into()),
        }
    }
    info!(imported, total, "user import finished");
    println!(
        "{}",
        serde_json::json!({"imported": imported, "skipped": total - imported})
    );
    Ok(())
}

async fn register_app(store: &dyn AcessoStore, args: &RegisterAppArgs) -> Result<()> {
    if store.find_user(&args.owner).await?.is_none() {
        return Err(Error::Custom(format!("unknown owner '{}'", args.owner)));
    }

    let mut app = Application::new(args.owner.as_str(), args.name.as_str());
    app.description = args.description.clone();
    app.allowed_callback_urls = credentials::join_allow_list(&args.callback_urls)?;
    app.allowed_web_origins = credentials::join_allow_list(&args.web_origins)?;
    app.allowed_logout_urls = credentials::join_allow_list(&args.logout_urls)?;
    app.expiration = args.expiration;

    let app = credentials::create(store, app).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "name": app.name,
            "client_id": app.client_id,
            "secret": app.secret,
        }))?
    );
    Ok(())
}
