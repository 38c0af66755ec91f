use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_sync::api::router;
use todo_sync::app::App;
use todo_sync::config::{AppConfig, BackendKind};
use todo_sync::db;
use todo_sync::dispatcher::{Command, DispatchOutcome};
use todo_sync::state::{AppState, Sessions};

/// To-do list client backed by local storage or the task API.
#[derive(Parser, Debug)]
#[command(name = "todo", about = "To-do list client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show all tasks.
    List,
    /// Add a task.
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Edit a task through the edit modal.
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Mark as completed.
        #[arg(long, conflicts_with = "pending")]
        done: bool,
        /// Mark as pending.
        #[arg(long)]
        pending: bool,
    },
    /// Mark a task as completed.
    Done { id: i64 },
    /// Mark a completed task as pending again.
    Undo { id: i64 },
    /// Delete a task.
    Rm { id: i64 },
    /// Show or set the theme color.
    Theme { color: Option<String> },
    /// Show the signed in user (remote backend).
    Me,
    /// Revoke the current credential (remote backend).
    Logout,
    /// Run the task API server.
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "todo_sync=info,todo=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::new_from_env()?;

    if let Commands::Serve = cli.command {
        return serve(&config).await;
    }

    let app = App::start(&config).await?;
    let outcome = match cli.command {
        Commands::List | Commands::Serve => DispatchOutcome::Ignored,
        Commands::Add { title, description } => {
            app.dispatcher
                .dispatch(Command::Add { title, description })
                .await
        }
        Commands::Edit {
            id,
            title,
            description,
            done,
            pending,
        } => match app.dispatcher.edit(id).await {
            Ok(mut form) => {
                if let Some(title) = title {
                    form.title = title;
                }
                if let Some(description) = description {
                    form.description = description;
                }
                if done {
                    form.completed = true;
                } else if pending {
                    form.completed = false;
                }
                app.dispatcher.save_edit(form).await
            }
            Err(outcome) => outcome,
        },
        Commands::Done { id } => app.dispatcher.dispatch(Command::Complete(id)).await,
        Commands::Undo { id } => app.dispatcher.dispatch(Command::Uncomplete(id)).await,
        Commands::Rm { id } => app.dispatcher.dispatch(Command::Delete(id)).await,
        Commands::Theme { color } => {
            match color {
                Some(color) => println!("{}", app.theme.select(&color).await?),
                None => match &app.theme_color {
                    Some(current) => println!("{}", current),
                    None => println!("default"),
                },
            }
            app.shutdown().await;
            return Ok(());
        }
        command @ (Commands::Me | Commands::Logout) => {
            let session = app
                .session
                .as_ref()
                .ok_or("session commands need TODO_BACKEND=remote")?;
            if matches!(command, Commands::Me) {
                println!("{}", session.me().await?.username);
            } else {
                session.log_out().await?;
                println!("logged out");
            }
            app.shutdown().await;
            return Ok(());
        }
    };

    match &outcome {
        DispatchOutcome::Rejected(msg) => eprintln!("rejected: {}", msg),
        DispatchOutcome::Missing(id) => eprintln!("no task with id {}", id),
        DispatchOutcome::Failed(msg) => eprintln!("{}", msg),
        DispatchOutcome::Applied(_) | DispatchOutcome::Ignored => {}
    }
    print!("{}", app.dispatcher.view());
    app.shutdown().await;
    Ok(())
}

async fn serve(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.backend == BackendKind::Remote {
        warn!("TODO_BACKEND=remote has no effect on the server");
    }

    let pool = db::connect(&config.database_url).await?;

    let users = if config.api_users.is_empty() {
        let token = uuid::Uuid::new_v4().to_string();
        info!("TODO_API_USERS not set, accepting user 'demo' with token {}", token);
        vec![("demo".to_string(), token)]
    } else {
        config.api_users.clone()
    };

    let state = AppState {
        db: pool,
        sessions: Sessions::from_users(users),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
