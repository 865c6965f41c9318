//! Archivist CLI: operator console for the Discord archive.

mod cli;
mod cmd;
mod progress;
mod ui;

use clap::Parser;
use cli::{Cli, Commands, ConfigCommands, PostCommands, WorkflowCommands};
use std::io::{self, BufRead, Write};

fn init_tracing_stderr() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn main() {
    // Load .env into the process environment (system env takes priority).
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing_stderr();

    let config = cli.config;
    match cli.command {
        Commands::Workflow(sub) => match sub {
            WorkflowCommands::Run {
                dir,
                yes,
                stop_on_error,
                json,
            } => cmd::workflow::cmd_workflow_run(config, dir, yes, stop_on_error, json),
            WorkflowCommands::Check { dir } => cmd::workflow::cmd_workflow_check(config, dir),
        },
        Commands::Post(sub) => match sub {
            PostCommands::Create {
                channel,
                title,
                content,
                tags,
                resize_images,
            } => cmd::post::cmd_post_create(config, channel, title, content, tags, resize_images),
            PostCommands::Reply { target, content } => {
                cmd::post::cmd_post_reply(config, &target, content)
            }
            PostCommands::Edit { target, content } => {
                cmd::post::cmd_post_edit(config, &target, content)
            }
            PostCommands::Show { target } => cmd::post::cmd_post_show(config, &target),
            PostCommands::Delete { target, yes } => {
                cmd::post::cmd_post_delete(config, &target, yes)
            }
            PostCommands::StripAttachments { target, yes } => {
                cmd::post::cmd_post_strip_attachments(config, &target, yes)
            }
        },
        Commands::Channels => cmd::channels::cmd_channels(config),
        Commands::Setup { channel, force } => cmd::setup::cmd_setup(config, channel, force),
        Commands::Teardown { yes } => cmd::setup::cmd_teardown(config, yes),
        Commands::Config(sub) => match sub {
            ConfigCommands::Check => cmd::config::cmd_config_check(config),
            ConfigCommands::Path => cmd::config::cmd_config_path(config),
        },
    }
}

pub(crate) fn prompt_input(prompt: &str) -> String {
    print!("{prompt}");
    let _ = io::stdout().flush();
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).unwrap_or(0);
    line.trim().to_string()
}
