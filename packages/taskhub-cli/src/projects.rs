//! Project subcommands: list, create, and active-project selection.

use crate::{Cli, OutputFormat};
use anyhow::Result;
use clap::Subcommand;
use taskhub_core::api::types::{NewProject, Project};
use taskhub_core::auth::{ActiveProject, guard};
use taskhub_core::{ApiClient, SessionStore};

#[derive(Clone, Subcommand)]
pub enum ProjectCommands {
    /// List projects
    #[command(alias = "ls")]
    List,

    /// Create a new project
    Create {
        /// Project name
        #[arg(short, long)]
        name: String,

        /// Project description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Set the active project used by task commands
    Use {
        /// Project ID
        id: String,
    },
}

pub async fn run(
    cli: &Cli,
    client: &ApiClient,
    store: &SessionStore,
    command: ProjectCommands,
) -> Result<()> {
    if !guard::require_authenticated(store)? {
        std::process::exit(1);
    }
    guard::refresh_if_needed(client, store).await?;

    match command {
        ProjectCommands::List => cmd_list(cli, client, store).await,
        ProjectCommands::Create { name, description } => {
            cmd_create(cli, client, name, description).await
        }
        ProjectCommands::Use { id } => cmd_use(cli, client, store, id).await,
    }
}

async fn cmd_list(cli: &Cli, client: &ApiClient, store: &SessionStore) -> Result<()> {
    let projects: Vec<Project> = client.get("/projects").await?;

    match cli.format {
        OutputFormat::Text => {
            if projects.is_empty() {
                println!("No projects yet. Create one with 'taskhub project create --name <name>'.");
                return Ok(());
            }

            let active = store.active_project()?;
            println!("Found {} projects:", projects.len());
            println!();
            for project in &projects {
                let marker = match &active {
                    Some(active) if active.id == project.id => "*",
                    _ => " ",
                };
                let description = project.description.as_deref().unwrap_or("");
                println!("  {} {:12} {:24} {}", marker, project.id, project.name, description);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&projects)?);
        }
    }

    Ok(())
}

async fn cmd_create(
    cli: &Cli,
    client: &ApiClient,
    name: String,
    description: Option<String>,
) -> Result<()> {
    let project: Project = client
        .post("/projects", &NewProject { name, description })
        .await?;

    match cli.format {
        OutputFormat::Text => {
            println!("Created project '{}' ({})", project.name, project.id);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
    }

    Ok(())
}

async fn cmd_use(cli: &Cli, client: &ApiClient, store: &SessionStore, id: String) -> Result<()> {
    // Resolve the project first so a typo'd ID is caught here, not on the
    // next task command.
    let project: Project = client.get(&format!("/projects/{}", id)).await?;

    store.set_active_project(Some(ActiveProject {
        id: project.id.clone(),
        name: project.name.clone(),
    }))?;

    match cli.format {
        OutputFormat::Text => {
            println!("Active project set to '{}' ({})", project.name, project.id);
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "status": "active_project_set",
                    "project_id": project.id,
                    "project_name": project.name,
                })
            );
        }
    }

    Ok(())
}
