//! `archivist setup` and `archivist teardown`.

use super::{confirm, connect, runtime};
use crate::ui;
use std::path::PathBuf;

pub fn cmd_setup(config: Option<PathBuf>, channel: Option<String>, force: bool) {
    let archive = connect(config);
    let rt = runtime();
    let result = rt.block_on(async {
        match &channel {
            Some(name) => archive.setup_channel(name, force).await,
            None => archive.setup_archive(force).await,
        }
    });

    match result {
        Ok(summary) => {
            ui::success(match &channel {
                Some(_) => "Channel setup completed",
                None => "Archive setup completed",
            });
            ui::kv("Categories", &summary.categories_created.to_string());
            ui::kv("Created", &summary.channels_created.to_string());
            ui::kv("Updated", &summary.channels_updated.to_string());
            ui::kv("Webhooks", &summary.webhooks_created.to_string());
            if !force && summary.channels_created == 0 {
                ui::hint("Existing channels were left as-is; pass --force to rewrite their settings.");
            }
        }
        Err(e) => {
            ui::error(&e.to_string());
            std::process::exit(1);
        }
    }
}

pub fn cmd_teardown(config: Option<PathBuf>, yes: bool) {
    let archive = connect(config);
    let prefix = archive.config().forum_prefix.clone();
    if !yes
        && !confirm(&format!(
            "Delete every forum channel starting with \"{prefix}\" and all of its posts?"
        ))
    {
        ui::hint("Nothing deleted.");
        return;
    }

    let rt = runtime();
    match rt.block_on(archive.teardown_archive()) {
        Ok(deleted) if deleted.is_empty() => ui::hint("No archive channels found."),
        Ok(deleted) => {
            for name in &deleted {
                ui::check_ok(&format!("Deleted {name}"));
            }
            ui::success(&format!("Removed {} channel(s)", deleted.len()));
        }
        Err(e) => {
            ui::error(&e.to_string());
            std::process::exit(1);
        }
    }
}
