use std::path::PathBuf;

use acesso_api::config::{
    DEFAULT_BIND_ADDR, DEFAULT_DATABASE_URL, DEFAULT_REMOTE_USER_HEADER, DEFAULT_URL_PATH_PREFIX,
};
use acesso_core::config::TransactionExpiry;
use acesso_core::models::auth::DEFAULT_APPLICATION_EXPIRATION_SECS;
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "acesso_server", about = "Acesso authorization server")]
pub struct Cli {
    /// PostgreSQL connection URL.
    #[arg(long, global = true, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, global = true, default_value_t = 5)]
    pub max_connections: u32,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run migrations and serve the HTTP API.
    Serve(ServeArgs),
    /// Apply pending database migrations and exit.
    Migrate,
    /// Register a client application and print its credentials.
    RegisterApp(RegisterAppArgs),
    /// Import users from a JSON array of user records.
    ImportUsers {
        /// Path to the JSON file.
        file: PathBuf,
    },
    /// Print the version.
    Version,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Socket address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    pub bind_addr: String,

    /// Path prefix the routes are mounted under.
    #[arg(long, env = "URL_PATH_PREFIX", default_value = DEFAULT_URL_PATH_PREFIX)]
    pub url_path_prefix: String,

    /// Header carrying the username authenticated by the fronting proxy.
    #[arg(long, env = "REMOTE_USER_HEADER", default_value = DEFAULT_REMOTE_USER_HEADER)]
    pub remote_user_header: String,

    /// Require the Referer to match the application's web origins.
    #[arg(long, env = "ACESSO_CHECK_REFERER", value_parser = BoolishValueParser::new())]
    pub check_referer: bool,

    /// Delete a transaction when it is exchanged.
    #[arg(long, env = "ACESSO_SINGLE_USE_TRANSACTIONS", value_parser = BoolishValueParser::new())]
    pub single_use_transactions: bool,

    /// Transaction lifetime: `fixed` (10 minutes) or `application`.
    #[arg(long, env = "ACESSO_TRANSACTION_EXPIRY", default_value_t = TransactionExpiry::Fixed)]
    pub transaction_expiry: TransactionExpiry,
}

#[derive(Args, Debug)]
pub struct RegisterAppArgs {
    /// Username of the owning user.
    #[arg(long)]
    pub owner: String,

    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub description: Option<String>,

    /// Allowed callback URL (repeatable).
    #[arg(long = "callback-url")]
    pub callback_urls: Vec<String>,

    /// Allowed web origin (repeatable).
    #[arg(long = "web-origin")]
    pub web_origins: Vec<String>,

    /// Allowed logout URL (repeatable).
    #[arg(long = "logout-url")]
    pub logout_urls: Vec<String>,

    /// Application expiration in seconds.
    #[arg(long, default_value_t = DEFAULT_APPLICATION_EXPIRATION_SECS)]
    pub expiration: i32,
}
