//! `backoffice`: command-line client for back-office REST APIs.
//!
//! Logs in once, keeps the session in a file, and issues authenticated
//! calls; expired tokens are refreshed transparently.
//!
//! ```text
//! backoffice login --username ops@example.com --password ...
//! backoffice get /accounts --search acme --filter status=active
//! backoffice options /entities --search glo --label-field legal_name
//! backoffice logout
//! ```

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use backoffice_client::config::loader::{load_config, ConfigError};
use backoffice_client::lifecycle::signals::cancel_on_ctrl_c;
use backoffice_client::listing::{FieldNormalizer, ListQuery, Page, RemoteSelect};
use backoffice_client::observability::logging;
use backoffice_client::session::FileSessionStore;
use backoffice_client::{ApiClient, ClientConfig, ClientError, ClientResult};

#[derive(Parser)]
#[command(name = "backoffice")]
#[command(about = "Command-line client for back-office REST APIs", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override api.base_url
    #[arg(long)]
    base_url: Option<String>,

    /// Override auth.session_file
    #[arg(long)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,

        /// Name of the username field in the login body
        #[arg(long, default_value = "email")]
        user_field: String,
    },
    /// Forget the stored session
    Logout,
    /// GET a resource; list options turn it into a paginated query
    Get {
        path: String,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        search: Option<String>,

        /// Filter as key=value (repeatable)
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },
    /// Search a list endpoint and print {id, label} options
    Options {
        path: String,

        #[arg(long, default_value = "")]
        search: String,

        #[arg(long, default_value = "id")]
        id_field: String,

        #[arg(long, default_value = "name")]
        label_field: String,
    },
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn default_session_file() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".backoffice").join("session.json"),
        None => PathBuf::from(".backoffice-session.json"),
    }
}

/// Expand a leading `~/` against $HOME.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}

fn load(cli: &Cli) -> ClientResult<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    logging::init(&config.observability);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            if let ClientError::Http { .. } = e {
                eprintln!("{}", e.user_message());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: ClientConfig) -> ClientResult<()> {
    let session_path = cli
        .session_file
        .clone()
        .or_else(|| config.auth.session_file.as_deref().map(expand_home))
        .unwrap_or_else(default_session_file);
    let store = FileSessionStore::open(&session_path).map_err(ConfigError::Io)?;

    let client = ApiClient::new(config, Arc::new(store))?;
    let _interrupts = cancel_on_ctrl_c(client.canceller());

    match cli.command {
        Commands::Login {
            username,
            password,
            user_field,
        } => {
            let mut body = json!({ "password": password });
            body[user_field.as_str()] = Value::String(username);
            client.login(&body).await?;
            println!("Logged in; session stored in {}", session_path.display());
        }
        Commands::Logout => {
            client.logout();
            println!("Logged out");
        }
        Commands::Get {
            path,
            page,
            search,
            filters,
        } => {
            let value: Value = if page.is_some() || search.is_some() || !filters.is_empty() {
                let mut query = ListQuery::new();
                query.page = page;
                query.search = search;
                query.filters.extend(filters);
                let page: Page<Value> = client.list(path, &query).await?;
                serde_json::to_value(&page)?
            } else {
                client.get_json(&path).await?
            };
            print_json(&value)?;
        }
        Commands::Options {
            path,
            search,
            id_field,
            label_field,
        } => {
            let select = RemoteSelect::new(
                client.clone(),
                path,
                FieldNormalizer::new(id_field, label_field),
            );
            let options = select.fetch(&search).await?;
            print_json(&serde_json::to_value(&options)?)?;
        }
    }

    Ok(())
}

fn print_json(value: &Value) -> ClientResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
