use std::collections::HashSet;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use groupsync::api::{DiscussionApi, Group, HttpDiscussionApi, Message, NewGroup, NewMessage, RecordId};
use groupsync::config::{ConfigError, SyncConfig, non_zero_ms};
use groupsync::{DiscussionEngine, DiscussionState, NoticeLevel, SyncError};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error("stdin read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "groupsync", about = "Group discussion sync client")]
struct Cli {
    /// API root; overrides GROUPSYNC_BASE_URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Bearer token; overrides GROUPSYNC_ACCESS_TOKEN.
    #[arg(long)]
    token: Option<String>,

    #[arg(long)]
    group_poll_ms: Option<u64>,

    #[arg(long)]
    feed_poll_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List visible groups.
    Groups,
    /// Print one group's feed.
    Messages { group_id: RecordId },
    /// Post a message to a group.
    Send { group_id: RecordId, text: String },
    /// Create a group.
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Interactive session: live feed on stdout, commands and messages on stdin.
    Chat {
        #[arg(long)]
        group: Option<RecordId>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("groupsync=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let api = Arc::new(HttpDiscussionApi::new(&config)?);
    tracing::debug!(base_url = %api.base_url(), "api client ready");

    match cli.command {
        Command::Groups => print_json(&api.list_groups().await?),
        Command::Messages { group_id } => print_json(&api.list_messages(&group_id).await?),
        Command::Send { group_id, text } => {
            print_json(&api.send_message(&NewMessage { group: group_id, content: text }).await?)
        }
        Command::Create { name, description } => {
            print_json(&api.create_group(&NewGroup { name, description }).await?)
        }
        Command::Chat { group } => run_chat(api, &config, group).await,
    }
}

fn resolve_config(cli: &Cli) -> Result<SyncConfig, CliError> {
    let mut config = SyncConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = groupsync::config::normalize_base_url(base_url)?;
    }
    if let Some(token) = &cli.token {
        config.access_token = Some(token.clone());
    }
    if let Some(ms) = cli.group_poll_ms {
        config.group_poll_interval = non_zero_ms("--group-poll-ms", ms)?;
    }
    if let Some(ms) = cli.feed_poll_ms {
        config.feed_poll_interval = non_zero_ms("--feed-poll-ms", ms)?;
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

// =============================================================================
// CHAT
// =============================================================================

#[derive(Debug, PartialEq, Eq)]
enum ChatInput {
    Join(RecordId),
    Leave,
    Create { name: String, description: String },
    Groups,
    Quit,
    Say(String),
}

fn parse_chat_line(line: &str) -> ChatInput {
    let trimmed = line.trim();
    if let Some(id) = trimmed.strip_prefix("/join ") {
        let Ok(id) = id.trim().parse::<RecordId>();
        return ChatInput::Join(id);
    }
    if let Some(rest) = trimmed.strip_prefix("/create ") {
        let (name, description) = rest.split_once('|').unwrap_or((rest, ""));
        return ChatInput::Create { name: name.trim().to_owned(), description: description.trim().to_owned() };
    }
    match trimmed {
        "/leave" => ChatInput::Leave,
        "/groups" => ChatInput::Groups,
        "/quit" => ChatInput::Quit,
        _ => ChatInput::Say(line.to_owned()),
    }
}

/// Tracks what has already been written so each revision prints only news.
#[derive(Default)]
struct FeedPrinter {
    group: Option<RecordId>,
    seen: HashSet<RecordId>,
}

impl FeedPrinter {
    fn render(&mut self, state: &DiscussionState) {
        let active = state.active.as_ref().map(|g| g.id.clone());
        if active != self.group {
            self.seen.clear();
            self.group.clone_from(&active);
            match &state.active {
                Some(group) => println!("== {} ({} members) ==", group.name, group.member_count),
                None => println!("== no group selected; /groups to list, /join <id> to enter =="),
            }
        }
        for message in &state.messages {
            if self.seen.insert(message.id.clone()) {
                println!("{}", format_message(message, state));
            }
        }
    }
}

fn format_message(message: &Message, state: &DiscussionState) -> String {
    let mine = state.current_user.as_ref().is_some_and(|user| message.is_authored_by(user));
    let marker = if mine { " (you)" } else { "" };
    format!("[{}] {}{marker}: {}", message.timestamp, message.author, message.content)
}

fn print_groups(state: &DiscussionState) {
    if state.groups.is_empty() {
        println!("(no groups)");
    }
    for group in &state.groups {
        let id = group.id.to_string();
        println!("{id:>6}  {}  {}", group.name, group.description);
    }
}

/// Select `id` before the cached list has loaded by asking the server directly.
async fn open_group(engine: &DiscussionEngine, api: &dyn DiscussionApi, id: RecordId) -> Result<Group, SyncError> {
    let group = api
        .list_groups()
        .await?
        .into_iter()
        .find(|g| g.id == id)
        .ok_or(SyncError::UnknownGroup(id))?;
    engine.select(group.clone()).await;
    Ok(group)
}

async fn run_chat(api: Arc<HttpDiscussionApi>, config: &SyncConfig, group: Option<RecordId>) -> Result<(), CliError> {
    let engine = DiscussionEngine::new(api.clone(), config);
    let mut changes = engine.subscribe();
    engine.start().await;

    if let Some(id) = group {
        if let Err(e) = open_group(&engine, api.as_ref(), id).await {
            eprintln!("{e}; use /join once the list loads");
        }
    }

    let mut printer = FeedPrinter::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                printer.render(&engine.snapshot());
                engine.take_scroll_request();
                for notice in engine.take_notices() {
                    match notice.level {
                        NoticeLevel::Info => eprintln!("note: {}", notice.text),
                        NoticeLevel::Alert => eprintln!("alert: {}", notice.text),
                    }
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_chat_line(&line) {
                    ChatInput::Quit => break,
                    ChatInput::Groups => print_groups(&engine.snapshot()),
                    ChatInput::Leave => engine.deselect().await,
                    ChatInput::Join(id) => {
                        if let Err(e) = engine.select_by_id(&id).await {
                            eprintln!("{e}");
                        }
                    }
                    ChatInput::Create { name, description } => {
                        if let Err(e) = engine.create(&name, &description).await {
                            tracing::debug!(error = %e, "create failed");
                        }
                    }
                    ChatInput::Say(text) => {
                        engine.set_draft(text.clone());
                        if let Err(e) = engine.send(&text).await {
                            if e.is_transient() {
                                eprintln!("not sent ({e}); type it again to retry");
                            } else {
                                eprintln!("not sent: {e}");
                            }
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    engine.shutdown().await;
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
