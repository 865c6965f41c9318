//! Core types for the Archivist community archive.
//!
//! This crate defines the shared data structures used by the Discord
//! client, the workflow engine and the CLI. It contains no business logic.

pub mod attachment;
pub mod config;
pub mod error;
pub mod message;
pub mod workflow;
