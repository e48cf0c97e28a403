use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::normalize_database_url, directory, load_settings, App, ClientEvent, ClientSettings,
};
use identity::InMemoryIdentityProvider;
use shared::domain::Identity;
use storage::{DirectoryStore, Storage};
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "splitease", about = "Manage the SplitEase user and group directory")]
struct Cli {
    /// Overrides `database_url` from splitease.toml and the environment.
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    splash_delay_ms: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Adds an email to the user directory unless it is already there.
    RegisterUser { email: String },
    /// Lists the users a signed-in user can add to a group.
    ListUsers {
        #[arg(long = "as")]
        as_email: String,
    },
    CreateGroup {
        #[arg(long = "as")]
        as_email: String,
        #[arg(long)]
        name: String,
        #[arg(long = "member", required = true)]
        members: Vec<String>,
    },
    ListGroups,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(url) = cli.database_url {
        settings.database_url = url;
    }
    if let Some(delay) = cli.splash_delay_ms {
        settings.splash_delay_ms = delay;
    }
    settings.database_url = normalize_database_url(&settings.database_url);
    info!(database_url = %settings.database_url, "opening directory");
    let storage: Arc<dyn DirectoryStore> = Arc::new(Storage::new(&settings.database_url).await?);

    match cli.command {
        Command::RegisterUser { email } => {
            let email = email.trim();
            if directory::register_user_if_absent(storage.as_ref(), email).await? {
                println!("registered {email}");
            } else {
                println!("{email} is already registered");
            }
        }
        Command::ListUsers { as_email } => {
            let app = open_as(settings, storage, &as_email).await?;
            let mut formation = app.group_formation();
            for email in formation.load_directory().await? {
                println!("{email}");
            }
            app.shutdown().await;
        }
        Command::CreateGroup {
            as_email,
            name,
            members,
        } => {
            let app = open_as(settings, storage, &as_email).await?;
            let mut events = app.context().subscribe_events();
            let mut formation = app.group_formation();
            formation.toggle_selection_mode();
            let candidates = formation.load_directory().await?.to_vec();
            for member in &members {
                if !candidates.contains(member) {
                    bail!("{member} is not in the directory visible to {as_email}");
                }
                formation.toggle_selection(member);
            }
            formation.confirm_selection()?;
            formation.set_group_name(name);
            let name = formation.group_name().to_string();
            let group = formation.create_group(&name).await?;
            print_notices(&mut events);
            println!("{}", serde_json::to_string_pretty(&group)?);
            app.shutdown().await;
        }
        Command::ListGroups => {
            for group in directory::list_groups(storage.as_ref()).await? {
                println!("{}", serde_json::to_string(&group)?);
            }
        }
    }

    Ok(())
}

/// Starts the client with a restored session for `email` and waits out the splash screen.
async fn open_as(
    settings: ClientSettings,
    storage: Arc<dyn DirectoryStore>,
    email: &str,
) -> Result<App> {
    let provider = Arc::new(InMemoryIdentityProvider::new(
        settings.federated_token_config(),
    ));
    let email = email.trim();
    provider
        .restore_session(Identity::new(format!("cli:{email}"), email).verified())
        .await;
    directory::register_user_if_absent(storage.as_ref(), email).await?;

    let app = App::start(settings, storage, provider);
    let mut nav = app.navigator();
    let mut session = app.session();
    let screen = nav.resolve_splash(&mut session).await?;
    info!(?screen, %email, "session ready");
    Ok(app)
}

fn print_notices(events: &mut broadcast::Receiver<ClientEvent>) {
    while let Ok(event) = events.try_recv() {
        if let ClientEvent::Notice(notice) = event {
            eprintln!("{}: {}", notice.title, notice.message);
        }
    }
}
