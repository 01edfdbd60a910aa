//! Bibliotheca - library management service.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bibliotheca::{
    api::{self, ApiState},
    config::ServiceConfig,
    notify::{self, JsonTransport},
    store::Store,
};

/// Library management service.
#[derive(Parser)]
#[command(name = "bibliotheca", about = "Library management service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API daemon.
    Daemon {
        /// Address to bind the API server.
        #[arg(long, default_value = "0.0.0.0:3000", env = "BIBLIOTHECA_BIND")]
        bind: String,

        /// Path to the SQLite database file.
        #[arg(long, default_value = "bibliotheca.db", env = "BIBLIOTHECA_DB")]
        database: String,

        /// Secret for signing bearer tokens.
        #[arg(long, default_value = "dev-secret-change-me", env = "JWT_SECRET")]
        jwt_secret: String,

        /// From-address for outgoing notices.
        #[arg(long, default_value = "no-reply@lms.local", env = "SMTP_FROM")]
        mail_from: String,

        /// Admin account to seed at startup (requires --admin-password).
        #[arg(long, env = "ADMIN_EMAIL")]
        admin_email: Option<String>,

        /// Password for the seeded admin account.
        #[arg(long, env = "ADMIN_PASSWORD")]
        admin_password: Option<String>,

        /// Username for the seeded admin account.
        #[arg(long, default_value = "admin", env = "ADMIN_USERNAME")]
        admin_username: String,
    },

    /// Show a running daemon's health.
    Status {
        /// Daemon API URL.
        #[arg(long, env = "BIBLIOTHECA_API_URL", default_value = "http://localhost:3000")]
        api_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bibliotheca=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon {
            bind,
            database,
            jwt_secret,
            mail_from,
            admin_email,
            admin_password,
            admin_username,
        } => {
            let mut config = ServiceConfig::new(bind, database).with_jwt_secret(&jwt_secret);
            config.mail_from = mail_from;
            if let (Some(email), Some(password)) = (admin_email, admin_password) {
                config = config.with_admin(&admin_username, &email, &password);
            }
            run_daemon(config).await?;
        }

        Commands::Status { api_url } => {
            show_status(&api_url).await?;
        }
    }

    Ok(())
}

/// Run the API daemon.
async fn run_daemon(config: ServiceConfig) -> Result<()> {
    tracing::info!("Starting bibliotheca daemon...");

    let store = Store::connect(&config.database).await?;
    tracing::info!(database = %config.database, "store ready");

    if let Some(seed) = &config.admin_seed {
        store.seed_admin(seed).await?;
    }

    // The notice transport is injected here; swap in a real SMTP sender by
    // implementing NotificationSender.
    let notifier: Arc<dyn bibliotheca::notify::NotificationSender> = Arc::new(JsonTransport);

    let state = Arc::new(ApiState::new(store.clone(), &config, notifier.clone()));

    // Daily due-soon sweep.
    let _scheduler = notify::spawn_scheduler(store, notifier, config.mail_from.clone());
    tracing::info!("due-soon scheduler started");

    api::serve(state, &config.bind).await?;

    Ok(())
}

/// Show daemon health via API.
async fn show_status(api_url: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let url = format!("{}/health", api_url.trim_end_matches('/'));

    let response = client.get(&url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("Failed to get status: {}", response.status());
    }

    let status: serde_json::Value = response.json().await?;

    println!("Bibliotheca Status");
    println!("==================");
    println!("Ok:      {}", status["ok"]);
    println!("Books:   {}", status["books"]);
    println!("Members: {}", status["members"]);

    Ok(())
}
