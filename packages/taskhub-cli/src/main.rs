//! Taskhub CLI - manage projects and tasks from the terminal
//!
//! This binary lets a developer:
//! - Authenticate against Taskhub using the OAuth device flow
//! - Create, list and switch between projects
//! - Create, list, update and complete tasks

mod projects;
mod tasks;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use taskhub_core::api::config;
use taskhub_core::auth::guard;
use taskhub_core::{ApiClient, LoginMode, SessionStore, run_login};

#[derive(Parser)]
#[command(name = "taskhub")]
#[command(author = "Taskhub Team")]
#[command(version)]
#[command(about = "Manage Taskhub projects and tasks from the terminal")]
#[command(long_about = "
Taskhub CLI is a terminal client for the Taskhub task-management service.

Quick start:
  1. Sign in:             taskhub login
  2. Pick a project:      taskhub project use <id>
  3. Add a task:          taskhub task add --title \"Fix the build\"
  4. See what's open:     taskhub task list

Sessions last 24 hours and are refreshed silently when close to expiry.
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in to Taskhub using the device flow
    #[command(alias = "signin")]
    Login,

    /// Sign out and clear the local session
    #[command(alias = "signout")]
    Logout,

    /// Show authentication status (local state only, no network call)
    Status,

    /// Manage projects
    #[command(subcommand)]
    Project(projects::ProjectCommands),

    /// Manage tasks
    #[command(subcommand)]
    Task(tasks::TaskCommands),

    /// Show configuration paths and settings
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("taskhub={},taskhub_core={}", log_level, log_level).into()
            }),
        )
        .with_target(false)
        .init();

    let store = SessionStore::open_default()?;
    tracing::debug!("Session file: {}", store.path().display());
    let client = ApiClient::new(store.clone());

    match cli.command {
        Commands::Login => cmd_login(&client, &store).await,
        Commands::Logout => cmd_logout(&cli, &store).await,
        Commands::Status => cmd_status(&cli, &store).await,
        Commands::Project(ref command) => {
            projects::run(&cli, &client, &store, command.clone()).await
        }
        Commands::Task(ref command) => tasks::run(&cli, &client, &store, command.clone()).await,
        Commands::Config => cmd_config(&cli, &store).await,
    }
}

async fn cmd_login(client: &ApiClient, store: &SessionStore) -> Result<()> {
    if guard::is_authenticated(store)? {
        let email = store
            .user()?
            .map(|u| u.email)
            .unwrap_or_else(|| "this account".to_string());
        println!("Already signed in as {}.", email);
        println!("Use 'taskhub logout' to sign out first.");
        return Ok(());
    }

    println!("Starting sign-in...");

    match run_login(client, store, LoginMode::Interactive).await? {
        true => {
            println!();
            match store.user()? {
                Some(user) => println!("Signed in as {}", user.email),
                None => println!("Signed in."),
            }
            Ok(())
        }
        // The flow already printed the timeout message.
        false => std::process::exit(1),
    }
}

async fn cmd_logout(cli: &Cli, store: &SessionStore) -> Result<()> {
    let user = store.user()?;
    store.clear_session()?;

    match cli.format {
        OutputFormat::Text => match user {
            Some(user) => println!("Signed out {}.", user.email),
            None => println!("Signed out."),
        },
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "status": "signed_out" }));
        }
    }

    Ok(())
}

async fn cmd_status(cli: &Cli, store: &SessionStore) -> Result<()> {
    let authenticated = guard::is_authenticated(store)?;
    let user = store.user()?;
    let expiry = store.expiry()?;
    let active_project = store.active_project()?;

    match cli.format {
        OutputFormat::Text => {
            if authenticated {
                println!("Status:  Signed in");
                if let Some(user) = &user {
                    println!("Email:   {}", user.email);
                    if let Some(name) = &user.name {
                        println!("Name:    {}", name);
                    }
                }
                if let Some(expiry) = expiry {
                    println!("Expires: {}", expiry.format("%Y-%m-%d %H:%M UTC"));
                }
                if let Some(project) = &active_project {
                    println!("Project: {} ({})", project.name, project.id);
                }
            } else {
                println!("Status: Not signed in");
                println!();
                println!("Run 'taskhub login' to authenticate.");
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "authenticated": authenticated,
                    "email": user.as_ref().map(|u| u.email.clone()),
                    "name": user.as_ref().and_then(|u| u.name.clone()),
                    "expires_at": expiry,
                    "active_project": active_project,
                })
            );
        }
    }

    Ok(())
}

async fn cmd_config(cli: &Cli, store: &SessionStore) -> Result<()> {
    let api_config = config::load_api_config();
    let config_path = config::get_config_file_path_string();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration");
            println!("=============");
            println!();
            println!("Config file:   {}", config_path);
            println!("API endpoint:  {} (from {})", api_config.api_url, api_config.source);
            println!("Session file:  {}", store.path().display());
            println!();
            println!("Environment variables:");
            println!("  TASKHUB_API_URL - Override API endpoint");
            println!();
            println!("Example config.toml:");
            println!();
            println!("{}", config::generate_example_config());
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "config_file": config_path,
                    "api_url": api_config.api_url,
                    "api_source": format!("{}", api_config.source),
                    "session_file": store.path().display().to_string(),
                })
            );
        }
    }

    Ok(())
}
