//! Task subcommands: list, add, update, complete, delete.

use crate::{Cli, OutputFormat};
use anyhow::Result;
use clap::Subcommand;
use taskhub_core::api::types::{NewTask, Task, TaskUpdate};
use taskhub_core::auth::guard;
use taskhub_core::{ApiClient, SessionStore};

#[derive(Clone, Subcommand)]
pub enum TaskCommands {
    /// List tasks
    #[command(alias = "ls")]
    List {
        /// Filter by project (defaults to the active project)
        #[arg(short, long)]
        project: Option<String>,

        /// Filter by status (e.g. open, done)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Add a new task
    Add {
        /// Task title
        #[arg(short, long)]
        title: String,

        /// Project to add the task to (defaults to the active project)
        #[arg(short, long)]
        project: Option<String>,

        /// Priority (e.g. low, medium, high)
        #[arg(long)]
        priority: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },

    /// Mark a task as done
    Done {
        /// Task ID
        id: String,
    },

    /// Update fields on a task
    Update {
        /// Task ID
        id: String,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New status
        #[arg(short, long)]
        status: Option<String>,

        /// New priority
        #[arg(long)]
        priority: Option<String>,

        /// New due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },

    /// Delete a task
    #[command(alias = "rm")]
    Delete {
        /// Task ID
        id: String,
    },
}

pub async fn run(
    cli: &Cli,
    client: &ApiClient,
    store: &SessionStore,
    command: TaskCommands,
) -> Result<()> {
    if !guard::require_authenticated(store)? {
        std::process::exit(1);
    }
    guard::refresh_if_needed(client, store).await?;

    match command {
        TaskCommands::List { project, status } => {
            cmd_list(cli, client, store, project, status).await
        }
        TaskCommands::Add {
            title,
            project,
            priority,
            due,
        } => cmd_add(cli, client, store, title, project, priority, due).await,
        TaskCommands::Done { id } => cmd_done(cli, client, id).await,
        TaskCommands::Update {
            id,
            title,
            status,
            priority,
            due,
        } => cmd_update(cli, client, id, title, status, priority, due).await,
        TaskCommands::Delete { id } => cmd_delete(cli, client, id).await,
    }
}

/// Fall back to the active project when no explicit project was given.
fn resolve_project(store: &SessionStore, project: Option<String>) -> Result<Option<String>> {
    match project {
        Some(id) => Ok(Some(id)),
        None => Ok(store.active_project()?.map(|p| p.id)),
    }
}

async fn cmd_list(
    cli: &Cli,
    client: &ApiClient,
    store: &SessionStore,
    project: Option<String>,
    status: Option<String>,
) -> Result<()> {
    let mut query = Vec::new();
    if let Some(project_id) = resolve_project(store, project)? {
        query.push(format!("project_id={}", project_id));
    }
    if let Some(status) = status {
        query.push(format!("status={}", status));
    }

    let path = if query.is_empty() {
        "/tasks".to_string()
    } else {
        format!("/tasks?{}", query.join("&"))
    };

    let tasks: Vec<Task> = client.get(&path).await?;

    match cli.format {
        OutputFormat::Text => {
            if tasks.is_empty() {
                println!("No tasks found.");
                return Ok(());
            }

            println!("Found {} tasks:", tasks.len());
            println!();
            for task in &tasks {
                let priority = task.priority.as_deref().unwrap_or("-");
                let due = task.due.as_deref().unwrap_or("-");
                println!(
                    "  {:12} {:10} {:8} {:10}  {}",
                    task.id, task.status, priority, due, task.title
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
    }

    Ok(())
}

async fn cmd_add(
    cli: &Cli,
    client: &ApiClient,
    store: &SessionStore,
    title: String,
    project: Option<String>,
    priority: Option<String>,
    due: Option<String>,
) -> Result<()> {
    let task: Task = client
        .post(
            "/tasks",
            &NewTask {
                title,
                project_id: resolve_project(store, project)?,
                priority,
                due,
            },
        )
        .await?;

    match cli.format {
        OutputFormat::Text => {
            println!("Added task '{}' ({})", task.title, task.id);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
    }

    Ok(())
}

async fn cmd_done(cli: &Cli, client: &ApiClient, id: String) -> Result<()> {
    let task: Task = client
        .put(
            &format!("/tasks/{}", id),
            &TaskUpdate {
                status: Some("done".to_string()),
                ..TaskUpdate::default()
            },
        )
        .await?;

    match cli.format {
        OutputFormat::Text => {
            println!("Completed '{}' ({})", task.title, task.id);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
    }

    Ok(())
}

async fn cmd_update(
    cli: &Cli,
    client: &ApiClient,
    id: String,
    title: Option<String>,
    status: Option<String>,
    priority: Option<String>,
    due: Option<String>,
) -> Result<()> {
    let update = TaskUpdate {
        title,
        status,
        priority,
        due,
    };

    if update.is_empty() {
        println!("Nothing to update.");
        return Ok(());
    }

    let task: Task = client.put(&format!("/tasks/{}", id), &update).await?;

    match cli.format {
        OutputFormat::Text => {
            println!("Updated '{}' ({})", task.title, task.id);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
    }

    Ok(())
}

async fn cmd_delete(cli: &Cli, client: &ApiClient, id: String) -> Result<()> {
    client.delete(&format!("/tasks/{}", id)).await?;

    match cli.format {
        OutputFormat::Text => {
            println!("Deleted task {}", id);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "status": "deleted", "task_id": id }));
        }
    }

    Ok(())
}
