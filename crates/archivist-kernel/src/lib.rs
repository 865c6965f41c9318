//! Archivist kernel: the workflow execution engine.
//!
//! A run reads `workflow.json` from an operator-chosen directory, validates
//! every task and thread message without touching Discord, then creates the
//! forum posts in order. Thread replies run as background chains, and
//! `{{name}}` references that pointed at posts not yet created are patched
//! once everything has settled.

pub mod cache;
pub mod config;
pub mod content;
pub mod delay;
pub mod error;
pub mod progress;
pub mod resize;
pub mod runner;
pub mod schema;
pub mod source;
pub mod tokens;
pub mod validator;

pub use runner::{Operator, RunReport, Severity, WorkflowRunner};
