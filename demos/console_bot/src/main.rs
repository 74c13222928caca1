//! Console Bot
//!
//! Drives an Ivy engine from the terminal: every line typed is a message in
//! a single guild, and replies are printed back.
//!
//! ```bash
//! cargo run --package console-bot -- --prefix ! --grant SEND_MESSAGES --super-user
//! ```
//!
//! Try `!ping`, `!queue add never gonna give you up`, `!queue list`,
//! `!queue -h`, `!echo` and `!fail oops`.

mod commands;
mod console;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use ivy::core::{GuildId, Role, User, UserId};
use ivy::runtime::{ConfigLoader, IvyConfig, IvyEngine};
use tracing::info;

use crate::commands::{Echo, Fail, Ping, QueueHealth, QueueModule, queue_command};
use crate::console::{ConsoleOracle, spawn_reader};

#[derive(Parser, Debug)]
#[command(name = "console-bot", about = "Talk to an Ivy bot from the terminal")]
struct Args {
    /// Configuration file (defaults to searching for ivy.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile.
    #[arg(long)]
    profile: Option<String>,

    /// Command prefix, overriding the configuration.
    #[arg(short, long)]
    prefix: Option<String>,

    /// Your user name.
    #[arg(short, long, default_value = "console")]
    user: String,

    /// The guild every message is sent in.
    #[arg(short, long, default_value = "console-guild")]
    guild: String,

    /// Roles you hold.
    #[arg(long = "role")]
    roles: Vec<String>,

    /// Platform permissions you hold, e.g. SEND_MESSAGES.
    #[arg(long = "grant")]
    grants: Vec<String>,

    /// Make yourself a super user.
    #[arg(long)]
    super_user: bool,

    /// Show verbose error reports in this guild.
    #[arg(long)]
    report_errors: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    let engine = IvyEngine::builder(config)
        .oracle(Arc::new(ConsoleOracle::new(args.grants.clone())))
        .capture_panics()
        .build()
        .await?;

    let queue = Arc::new(QueueModule::default());
    engine.register_module(queue.clone()).await?;
    engine.register_command(Ping::new()).await?;
    engine.register_command(Fail::new()).await?;
    engine.register_command(queue_command(queue.clone())).await?;
    engine.register_flow(Echo).await?;
    engine.register_managed_flow(QueueHealth, queue).await?;
    engine.start();

    let author = User::new(args.user.as_str(), args.user.as_str());
    let roles = args
        .roles
        .iter()
        .enumerate()
        .map(|(i, name)| Role::new(format!("role-{i}"), name.as_str()))
        .collect();
    let events = spawn_reader(author, GuildId::new(args.guild.as_str()), roles);

    info!(user = %args.user, guild = %args.guild, "Type messages below, Ctrl+D to quit");
    engine.run(events).await;
    Ok(())
}

fn load_config(args: &Args) -> Result<IvyConfig> {
    let mut loader = ConfigLoader::new().with_current_dir();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    if let Some(profile) = &args.profile {
        loader = loader.profile(profile);
    }

    let mut config = loader.load()?;
    if let Some(prefix) = &args.prefix {
        config.prefix = Some(prefix.clone());
    }
    if config.prefix.is_none() {
        config.prefix = Some("!".to_string());
    }
    if args.super_user {
        config.super_perms.push(UserId::new(args.user.as_str()));
    }
    if args.report_errors {
        config.report_errors.push(GuildId::new(args.guild.as_str()));
    }
    Ok(config)
}
