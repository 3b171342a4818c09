//! `yatube`: the Yatube web server and its admin commands.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `YATUBE_*`
//! environment variables, opens the SQLite store, and either serves the site
//! or runs a one-off maintenance command.
//!
//! ```
//! yatube serve
//! yatube create-group --title Cats --slug cats
//! yatube delete-user --username spammer
//! ```

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;
use yatube_core::{group::NewGroup, store::BlogStore};
use yatube_store_sqlite::SqliteStore;
use yatube_web::{AppState, ServerConfig, mail::Mailer};

#[derive(Parser)]
#[command(author, version, about = "Yatube blogging platform")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the site over HTTP (the default).
  Serve,
  /// Create a community group.
  CreateGroup {
    #[arg(long)]
    title:       String,
    #[arg(long)]
    slug:        String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    rules:       String,
  },
  /// Delete a group; its posts are kept without a group.
  DeleteGroup {
    #[arg(long)]
    slug: String,
  },
  /// Delete a user with all their posts, comments and subscriptions.
  DeleteUser {
    #[arg(long)]
    username: String,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut server_cfg = yatube_web::config::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;
  server_cfg.database_path = yatube_web::config::expand_tilde(&server_cfg.database_path);
  server_cfg.media_dir = yatube_web::config::expand_tilde(&server_cfg.media_dir);

  let store = SqliteStore::open(&server_cfg.database_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.database_path))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(store, server_cfg).await,
    Command::CreateGroup { title, slug, description, rules } => {
      let group = store
        .create_group(NewGroup { title, slug, description, rules })
        .await
        .context("failed to create group")?;
      println!("created group {} (/group/{}/)", group.title, group.slug);
      Ok(())
    }
    Command::DeleteGroup { slug } => {
      let Some(group) = store.get_group_by_slug(&slug).await? else {
        bail!("no group with slug {slug:?}");
      };
      store.delete_group(group.id).await.context("failed to delete group")?;
      println!("deleted group {slug}");
      Ok(())
    }
    Command::DeleteUser { username } => {
      let Some(user) = store.get_user_by_username(&username).await? else {
        bail!("no user named {username:?}");
      };
      store.delete_user(user.id).await.context("failed to delete user")?;
      println!("deleted user {username}");
      Ok(())
    }
  }
}

async fn serve(store: SqliteStore, server_cfg: ServerConfig) -> anyhow::Result<()> {
  let mailer = Mailer::from_config(&server_cfg.mail).context("invalid mail configuration")?;
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  let state = AppState::new(store, server_cfg, mailer);
  let app = yatube_web::router(state);

  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
