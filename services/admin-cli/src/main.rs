//! eduadmin
//!
//! Command-line admin console for the education platform backend:
//! 1. Loads configuration (file, env, flags)
//! 2. Opens the persisted session
//! 3. Runs one subcommand through the session-aware API client
//! 4. Prints the unwrapped `data` as JSON on stdout

mod config;
mod console;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use admin_api::{ApiClient, ClientConfig, Resource, Upload};
use admin_auth::{ProfileUpdate, SessionStore};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, resolve_password};
use crate::console::ConsoleSurface;

#[derive(Debug, Parser)]
#[command(name = "eduadmin", version, about = "Admin console client for the education platform API")]
struct Cli {
    /// Config file (falls back to CONFIG_PATH, then ./eduadmin.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overrides config and API_BASE_URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Session file, overrides [session] path
    #[arg(long, global = true)]
    session: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in as an admin
    Login {
        email: String,
        /// Read the password from this file instead of ADMIN_PASSWORD
        #[arg(long)]
        password_file: Option<PathBuf>,
    },
    /// Sign out and clear the stored session
    Logout,
    /// Show the signed-in user from the server
    Whoami,
    /// Show the locally stored session state
    Status,
    /// Update the signed-in user's profile
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
    },
    /// List a collection
    List {
        resource: Resource,
        /// Query parameter as key=value, repeatable
        #[arg(long = "query", short = 'q', value_parser = parse_pair)]
        query: Vec<(String, String)>,
    },
    /// Fetch one item
    Get { resource: Resource, id: String },
    /// Create an item from JSON (inline or @file)
    Create {
        resource: Resource,
        #[arg(long)]
        data: String,
    },
    /// Replace an item from JSON (inline or @file)
    Update {
        resource: Resource,
        id: String,
        #[arg(long)]
        data: String,
    },
    /// Delete an item
    Delete { resource: Resource, id: String },
    /// Upload an image file
    UploadImage {
        path: PathBuf,
        /// Multipart field name
        #[arg(long, default_value = "image")]
        field: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = Config::load_resolved(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(url) = cli.base_url.clone() {
        config.api.base_url = url;
    }
    if let Some(path) = cli.session.clone() {
        config.session.path = path;
    }
    info!(
        base_url = %config.api.base_url,
        session = %config.session.path.display(),
        "configuration loaded"
    );

    let store = open_store(&config.session.path).await?;
    let client = ApiClient::builder()
        .config(ClientConfig::new(config.api.base_url.clone()).with_timeout(config.timeout()))
        .store(store)
        .surface(Arc::new(ConsoleSurface))
        .build()?;

    run(&client, &config, cli.command).await
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn open_store(path: &Path) -> Result<Arc<SessionStore>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create session directory {}", parent.display()))?;
    }
    let store = SessionStore::load(path.to_path_buf())
        .await
        .with_context(|| format!("failed to open session file {}", path.display()))?;
    Ok(Arc::new(store))
}

async fn run(client: &ApiClient, config: &Config, command: Command) -> Result<()> {
    debug!(?command, "running command");
    match command {
        Command::Login {
            email,
            password_file,
        } => {
            let password = resolve_password(password_file.as_deref())?;
            let envelope = client.login(&email, &password).await?;
            let user = envelope.data.map(|payload| payload.user);
            if let Some(user) = user {
                eprintln!("Signed in as {} <{}>", user.name, user.email);
            }
            Ok(())
        }
        Command::Logout => {
            client.logout().await?;
            eprintln!("Signed out.");
            Ok(())
        }
        Command::Whoami => print_json(&client.current_user().await?),
        Command::Status => {
            let user = client.session_user().await;
            print_json(&serde_json::json!({
                "baseUrl": client.dispatcher().base_url(),
                "sessionPath": config.session.path,
                "authenticated": client.is_authenticated().await,
                "admin": client.is_admin().await,
                "user": user,
            }))
        }
        Command::Profile { name, avatar } => {
            let update = ProfileUpdate { name, avatar };
            if update.is_empty() {
                bail!("pass --name and/or --avatar");
            }
            print_json(&client.update_profile(&update).await?)
        }
        Command::List { resource, query } => {
            let pairs: Vec<(&str, &str)> = query
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            let items: Value = client.list(resource, &pairs).await?;
            print_json(&items)
        }
        Command::Get { resource, id } => {
            let item: Value = client.fetch(resource, &id).await?;
            print_json(&item)
        }
        Command::Create { resource, data } => {
            let body = read_json(&data)?;
            let item: Value = client.create(resource, &body).await?;
            print_json(&item)
        }
        Command::Update { resource, id, data } => {
            let body = read_json(&data)?;
            let item: Value = client.update(resource, &id, &body).await?;
            print_json(&item)
        }
        Command::Delete { resource, id } => {
            let _: Value = client.remove(resource, &id).await?;
            Ok(())
        }
        Command::UploadImage { path, field } => {
            let upload = Upload::from_path(field, &path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?
                .on_progress(|progress| {
                    let mut stderr = std::io::stderr().lock();
                    let _ = write!(stderr, "\ruploading {:>3.0}%", progress.fraction() * 100.0);
                    if progress.loaded >= progress.total {
                        let _ = writeln!(stderr);
                    }
                });
            let image: Value = client.upload_image(upload).await?;
            print_json(&image)
        }
    }
}

/// Inline JSON, or `@path` to read it from a file.
fn read_json(arg: &str) -> Result<Value> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?,
        None => arg.to_owned(),
    };
    serde_json::from_str(&text).context("--data is not valid JSON")
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
