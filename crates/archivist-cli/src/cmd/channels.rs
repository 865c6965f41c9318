//! `archivist channels`.

use super::config_only;
use crate::ui;
use colored::Colorize;
use std::path::PathBuf;

pub fn cmd_channels(config: Option<PathBuf>) {
    let config = config_only(config);
    if config.channels.is_empty() {
        ui::error_with_fix(
            "No channels configured",
            "add a [channels] table to the config file",
        );
        std::process::exit(1);
    }

    for (category, channels) in &config.channels {
        ui::section(category);
        for channel in channels {
            println!(
                "  {:<20} {}",
                channel.name.bold(),
                channel.display_name.dimmed()
            );
            if !channel.tags.is_empty() {
                println!("  {:<20} {}", "", channel.tags.join(", "));
            }
        }
        ui::blank();
    }
}
