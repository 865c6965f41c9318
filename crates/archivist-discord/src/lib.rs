//! Discord integration for Archivist.
//!
//! Exposes the [`api::ArchiveApi`] trait the workflow engine drives, and a
//! Discord implementation that posts through bot-owned channel webhooks so
//! archive posts carry the channel's display name instead of the bot's.

pub mod api;
pub mod archive;
pub mod formatter;
pub mod models;
pub mod rest;
pub mod setup;
