//! Clap CLI definitions for Archivist.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub const AFTER_HELP: &str = "\
\x1b[1;36mExamples:\x1b[0m
  archivist config check                 Validate ~/.archivist/config.toml
  archivist setup --force                Create or update every archive channel
  archivist workflow check ./batch       Dry-run a workflow directory
  archivist workflow run ./batch         Post a workflow
  archivist post show <message link>     Print a posted message

\x1b[1;36mEnvironment:\x1b[0m
  DISCORD_BOT_TOKEN   Bot token (name configurable via bot_token_env)
  GUILD_ID            Overrides guild_id from the config file
  DISCORD_CLIENT_ID   Overrides client_id from the config file";

/// Archivist: batch archiving into Discord forum channels.
#[derive(Parser)]
#[command(
    name = "archivist",
    version,
    about = "Archive community content into Discord forum channels",
    after_help = AFTER_HELP,
)]
pub struct Cli {
    /// Path to config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run or check workflow directories [*].
    #[command(subcommand)]
    Workflow(WorkflowCommands),
    /// Single post operations (create, reply, edit, show, delete) [*].
    #[command(subcommand)]
    Post(PostCommands),
    /// List configured archive channels and their tags.
    Channels,
    /// Create missing categories, forum channels and webhooks.
    Setup {
        /// Only set up this configured channel.
        channel: Option<String>,
        /// Rewrite settings of channels that already exist.
        #[arg(long)]
        force: bool,
    },
    /// Delete every archive forum channel.
    Teardown {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Inspect configuration [*].
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum WorkflowCommands {
    /// Validate and execute a workflow directory.
    Run {
        /// Directory containing workflow.json and task folders.
        dir: PathBuf,
        /// Continue with remaining tasks after a failed post without asking.
        #[arg(long, conflicts_with = "stop_on_error")]
        yes: bool,
        /// Stop at the first failed post without asking.
        #[arg(long)]
        stop_on_error: bool,
        /// Print the final report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Validate a workflow directory without posting anything.
    Check {
        /// Directory containing workflow.json and task folders.
        dir: PathBuf,
    },
}

/// Message content given inline or read from a file.
#[derive(Args, Clone, Debug, Default)]
pub struct ContentArgs {
    /// Message text; `@name:userid` becomes a user link.
    #[arg(long, short = 'm', conflicts_with = "content_file")]
    pub content: Option<String>,
    /// Read message text from a file.
    #[arg(long)]
    pub content_file: Option<PathBuf>,
    /// Files to attach (repeatable).
    #[arg(long = "file", short = 'f')]
    pub files: Vec<PathBuf>,
}

#[derive(Subcommand)]
pub enum PostCommands {
    /// Create a forum post in an archive channel.
    Create {
        /// Configured channel name.
        channel: String,
        /// Post title.
        title: String,
        #[command(flatten)]
        content: ContentArgs,
        /// Forum tags (repeatable).
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,
        /// Pad images before upload.
        #[arg(long)]
        resize_images: bool,
    },
    /// Reply inside an existing post.
    Reply {
        /// Thread id or message link.
        target: String,
        #[command(flatten)]
        content: ContentArgs,
    },
    /// Replace the content of a posted message.
    Edit {
        /// Message link, or thread id for the starter message.
        target: String,
        #[command(flatten)]
        content: ContentArgs,
    },
    /// Print the content of a posted message.
    Show {
        /// Message link, or thread id for the starter message.
        target: String,
    },
    /// Delete a posted message.
    Delete {
        /// Message link, or thread id for the starter message.
        target: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Remove every attachment from a posted message.
    StripAttachments {
        /// Message link, or thread id for the starter message.
        target: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Report configuration problems.
    Check,
    /// Print the config file path in use.
    Path,
}
