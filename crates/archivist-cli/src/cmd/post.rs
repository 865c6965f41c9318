//! `archivist post ...`: single post operations.

use super::{confirm, connect, runtime};
use crate::cli::ContentArgs;
use crate::ui;
use archivist_discord::api::{ArchiveApi, NewForumPost};
use archivist_discord::formatter::{message_link, parse_target, MessageTarget};
use archivist_kernel::content::{content_len, ContentResolver};
use archivist_kernel::resize::{ImageResizer, PaddingResizer};
use archivist_types::attachment::Attachment;
use archivist_types::error::ArchiveResult;
use archivist_types::message::MessageInfo;
use std::path::{Path, PathBuf};

/// Resolved message body and attachments.
#[derive(Debug)]
struct Body {
    content: String,
    files: Vec<Attachment>,
}

/// Read content and files, apply mention markup and enforce the length limit.
fn load_body(args: &ContentArgs, max_chars: usize) -> Result<Body, String> {
    let raw = match (&args.content, &args.content_file) {
        (_, Some(path)) => std::fs::read(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?,
        (Some(text), None) => text.clone(),
        (None, None) => String::new(),
    };
    let content = ContentResolver::default().resolve(&raw);
    let length = content_len(&content);
    if length > max_chars {
        return Err(format!(
            "Content exceeds the {max_chars} character limit ({length} characters)"
        ));
    }

    let files = args
        .files
        .iter()
        .map(|path| read_attachment(path))
        .collect::<Result<Vec<_>, _>>()?;

    if content.trim().is_empty() && files.is_empty() {
        return Err("Provide --content, --content-file or at least one --file".to_string());
    }
    Ok(Body { content, files })
}

fn read_attachment(path: &Path) -> Result<Attachment, String> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| format!("Not a file: {}", path.display()))?;
    let data = std::fs::read(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    Ok(Attachment::new(name, data))
}

fn target_or_exit(input: &str) -> MessageTarget {
    match parse_target(input) {
        Some(target) => target,
        None => {
            ui::error_with_fix(
                &format!("Not a thread id or message link: {input}"),
                "paste a link like https://discord.com/channels/<guild>/<thread>/<message>",
            );
            std::process::exit(1);
        }
    }
}

fn body_or_exit(args: &ContentArgs, max_chars: usize) -> Body {
    match load_body(args, max_chars) {
        Ok(body) => body,
        Err(e) => {
            ui::error(&e);
            std::process::exit(1);
        }
    }
}

fn finish(result: ArchiveResult<MessageInfo>, done: &str) {
    match result {
        Ok(info) => {
            ui::success(done);
            ui::kv(
                "Link",
                &message_link(&info.guild_id, &info.thread_id, &info.message_id),
            );
        }
        Err(e) => {
            ui::error(&e.to_string());
            std::process::exit(1);
        }
    }
}

pub fn cmd_post_create(
    config: Option<PathBuf>,
    channel: String,
    title: String,
    content: ContentArgs,
    tags: Vec<String>,
    resize_images: bool,
) {
    let archive = connect(config);
    let Some(info) = archive.config().find_channel(&channel).cloned() else {
        ui::error_with_fix(
            &format!("Channel '{channel}' is not configured"),
            "run `archivist channels` to list archive channels",
        );
        std::process::exit(1);
    };
    let invalid = info.invalid_tags(&tags);
    if !invalid.is_empty() {
        ui::error(&format!(
            "Invalid tags for {}: {}",
            info.display_name,
            invalid.join(", ")
        ));
        ui::hint(&format!("Available tags: {}", info.tags.join(", ")));
        std::process::exit(1);
    }
    let body = body_or_exit(&content, archive.config().workflow.max_content_chars);

    let rt = runtime();
    let result = rt.block_on(async {
        let files = if resize_images {
            PaddingResizer::default().resize(body.files).await
        } else {
            body.files
        };
        archive
            .create_forum_post(NewForumPost {
                channel,
                title,
                content: body.content,
                tags,
                files,
            })
            .await
    });
    finish(result, "Post created");
}

pub fn cmd_post_reply(config: Option<PathBuf>, target: &str, content: ContentArgs) {
    let target = target_or_exit(target);
    let archive = connect(config);
    let body = body_or_exit(&content, archive.config().workflow.max_content_chars);
    let rt = runtime();
    let result = rt.block_on(archive.post_to_thread(&target.thread_id, &body.content, body.files));
    finish(result, "Reply posted");
}

pub fn cmd_post_edit(config: Option<PathBuf>, target: &str, content: ContentArgs) {
    let target = target_or_exit(target);
    let archive = connect(config);
    let body = body_or_exit(&content, archive.config().workflow.max_content_chars);
    let rt = runtime();
    let result = rt.block_on(archive.edit_message(
        &target.thread_id,
        target.message_id_or_thread(),
        &body.content,
        body.files,
    ));
    finish(result, "Message edited");
}

pub fn cmd_post_show(config: Option<PathBuf>, target: &str) {
    let target = target_or_exit(target);
    let archive = connect(config);
    let rt = runtime();
    match rt.block_on(archive.fetch_message_content(&target.thread_id, target.message_id_or_thread())) {
        Ok(content) => println!("{content}"),
        Err(e) => {
            ui::error(&e.to_string());
            std::process::exit(1);
        }
    }
}

pub fn cmd_post_delete(config: Option<PathBuf>, target: &str, yes: bool) {
    let target = target_or_exit(target);
    if !yes && !confirm("Delete this message? This cannot be undone.") {
        ui::hint("Nothing deleted.");
        return;
    }
    let archive = connect(config);
    let rt = runtime();
    let result = rt.block_on(archive.delete_post(&target.thread_id, target.message_id_or_thread()));
    finish(result, "Message deleted");
}

pub fn cmd_post_strip_attachments(config: Option<PathBuf>, target: &str, yes: bool) {
    let target = target_or_exit(target);
    if !yes && !confirm("Remove every attachment from this message?") {
        ui::hint("Nothing changed.");
        return;
    }
    let archive = connect(config);
    let rt = runtime();
    let result =
        rt.block_on(archive.delete_attachments(&target.thread_id, target.message_id_or_thread()));
    finish(result, "Attachments removed");
}
