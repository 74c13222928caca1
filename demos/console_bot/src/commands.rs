//! Demo commands.

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::bail;
use ivy::async_trait;
use ivy::core::format::{bold, code_block, emboss, number_ending, time_diff};
use ivy::core::{BoxedMessage, GuildQueue, Permission, RechargeManager, User};
use ivy::framework::{
    Command, CommandComponent, CommandReturn, CommandSpec, ComponentSpec, FlowOutput,
    GenericTestFlow, Invocation, Module, ModuleContext, MultiCommand, TestFlow,
};
use serde_json::json;
use tracing::info;

const PING_COOLDOWN: Duration = Duration::from_secs(3);

// =============================================================================
// ping
// =============================================================================

pub struct Ping {
    spec: CommandSpec,
    cooldowns: RechargeManager,
}

impl Ping {
    pub fn new() -> Self {
        Self {
            spec: CommandSpec::new("ping", "SEND_MESSAGES")
                .help("ping")
                .category("General")
                .keep_message(),
            cooldowns: RechargeManager::new(),
        }
    }
}

#[async_trait]
impl Command for Ping {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    async fn execute(&self, inv: Invocation) -> anyhow::Result<CommandReturn> {
        let start = Instant::now();
        if !self.cooldowns.recharge(&inv.user.id, PING_COOLDOWN) {
            let left = self.cooldowns.recharge_time(&inv.user.id).unwrap_or_default();
            inv.reply(format!(":hourglass: Slow down, try again in {:.1}s.", left.as_secs_f32()))
                .await?;
            return Ok(CommandReturn::Exit);
        }

        inv.reply(format!(":ping_pong: Pong! {}", emboss(format!("{}ms", time_diff(start)))))
            .await?;
        Ok(CommandReturn::Exit)
    }
}

// =============================================================================
// fail
// =============================================================================

/// Always fails, to show the error reports.
pub struct Fail(CommandSpec);

impl Fail {
    pub fn new() -> Self {
        Self(CommandSpec::new("fail", Permission::SuperPerms).help("fail [reason..]").hidden())
    }
}

#[async_trait]
impl Command for Fail {
    fn spec(&self) -> &CommandSpec {
        &self.0
    }

    async fn execute(&self, inv: Invocation) -> anyhow::Result<CommandReturn> {
        if inv.args.is_empty() {
            bail!("no reason given");
        }
        bail!("asked to fail: {}", inv.args.join(" "))
    }
}

// =============================================================================
// queue
// =============================================================================

/// Holds the per-guild song queues.
#[derive(Default)]
pub struct QueueModule {
    queue: GuildQueue<String>,
}

#[async_trait]
impl Module for QueueModule {
    fn name(&self) -> &str {
        "Queue"
    }

    async fn start(&self, _ctx: ModuleContext) -> anyhow::Result<()> {
        info!("Queue module ready");
        Ok(())
    }

    async fn end(&self) -> anyhow::Result<()> {
        self.queue.flush();
        Ok(())
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

pub fn queue_command(module: Arc<QueueModule>) -> MultiCommand<QueueModule> {
    let spec = CommandSpec::new("queue", "SEND_MESSAGES")
        .help("queue <add|list|skip|shuffle>")
        .category("Music");
    MultiCommand::builder(spec, module)
        .register(QueueAdd(ComponentSpec::new("add", "add <song..>", "SEND_MESSAGES")))
        .register(QueueList(ComponentSpec::new("list", "list", "SEND_MESSAGES")))
        .register(QueueSkip(ComponentSpec::new("skip", "skip", "MANAGE_MESSAGES")))
        .register(QueueShuffle(ComponentSpec::new("shuffle", "shuffle", "MANAGE_MESSAGES")))
        .build()
}

struct QueueAdd(ComponentSpec);

#[async_trait]
impl CommandComponent<QueueModule> for QueueAdd {
    fn spec(&self) -> &ComponentSpec {
        &self.0
    }

    async fn execute(&self, module: &Arc<QueueModule>, inv: Invocation) -> anyhow::Result<CommandReturn> {
        let Some(guild) = inv.guild_id().cloned() else {
            return Ok(CommandReturn::Exit);
        };
        if inv.args.is_empty() {
            return Ok(CommandReturn::HelpMenu);
        }

        let song = inv.args.join(" ");
        module.queue.push(&guild, song.clone());
        let position = module.queue.len(&guild);
        inv.reply(format!(
            ":notes: Queued {} ({}{} in line).",
            bold(&song),
            position,
            number_ending(position)
        ))
        .await?;
        Ok(CommandReturn::Exit)
    }
}

struct QueueList(ComponentSpec);

#[async_trait]
impl CommandComponent<QueueModule> for QueueList {
    fn spec(&self) -> &ComponentSpec {
        &self.0
    }

    async fn execute(&self, module: &Arc<QueueModule>, inv: Invocation) -> anyhow::Result<CommandReturn> {
        let songs = inv
            .guild_id()
            .and_then(|guild| module.queue.get(guild))
            .unwrap_or_default();
        if songs.is_empty() {
            inv.reply(":mailbox_with_no_mail: The queue is empty.").await?;
            return Ok(CommandReturn::Exit);
        }

        let listing = songs
            .iter()
            .enumerate()
            .map(|(i, song)| format!("{}. {song}", i + 1))
            .collect::<Vec<_>>()
            .join("\n");
        inv.reply(code_block("md", listing)).await?;
        Ok(CommandReturn::Exit)
    }
}

struct QueueSkip(ComponentSpec);

#[async_trait]
impl CommandComponent<QueueModule> for QueueSkip {
    fn spec(&self) -> &ComponentSpec {
        &self.0
    }

    async fn execute(&self, module: &Arc<QueueModule>, inv: Invocation) -> anyhow::Result<CommandReturn> {
        let skipped = inv.guild_id().and_then(|guild| module.queue.pop(guild));
        let reply = match skipped {
            Some(song) => format!(":track_next: Skipped {}.", bold(song)),
            None => ":mailbox_with_no_mail: Nothing to skip.".to_string(),
        };
        inv.reply(reply).await?;
        Ok(CommandReturn::Exit)
    }
}

struct QueueShuffle(ComponentSpec);

#[async_trait]
impl CommandComponent<QueueModule> for QueueShuffle {
    fn spec(&self) -> &ComponentSpec {
        &self.0
    }

    async fn execute(&self, module: &Arc<QueueModule>, inv: Invocation) -> anyhow::Result<CommandReturn> {
        if let Some(guild) = inv.guild_id() {
            module.queue.shuffle(guild, true);
        }
        inv.reply(":twisted_rightwards_arrows: Shuffled.").await?;
        Ok(CommandReturn::Exit)
    }
}

// =============================================================================
// flows
// =============================================================================

/// Checks the queue of the invoking guild.
pub struct QueueHealth;

#[async_trait]
impl GenericTestFlow<QueueModule> for QueueHealth {
    fn name(&self) -> &str {
        "queuehealth"
    }

    async fn run(&self, module: &Arc<QueueModule>, _user: &User, message: &BoxedMessage) -> anyhow::Result<FlowOutput> {
        let Some(guild) = message.guild_id() else {
            return Ok(FlowOutput::Failed(anyhow::anyhow!("not in a guild")));
        };
        Ok(FlowOutput::with_payload(json!({
            "guild": guild,
            "length": module.queue.len(guild),
            "head": module.queue.peek(guild),
        })))
    }
}

/// Round-trips a message through the transport.
pub struct Echo;

#[async_trait]
impl TestFlow for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    async fn run(&self, user: &User, message: &BoxedMessage) -> anyhow::Result<FlowOutput> {
        message.send(format!("echo from {}", user.name).into()).await?;
        Ok(FlowOutput::passed())
    }
}
