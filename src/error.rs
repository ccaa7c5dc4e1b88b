//! Error types.
//!
//! Two layers, matching the failure granularity of a run:
//!
//! - [`Error`] is fatal for one bill: the bill's own content could not be
//!   loaded, a rule table is malformed, configuration is unreadable. It
//!   propagates to the per-bill boundary (see `batch.rs`), where it becomes
//!   a [`BillError`] alongside panics.
//! - [`ApplyError`] is scoped to a single action. The walker logs it with the
//!   offending action and moves on; it never escapes a traversal.

use crate::{ActionKind, NodeId};
use std::any::Any;
use thiserror::Error;

/// Result type for fatal, per-bill operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A rule pattern failed to compile.
    #[error("invalid pattern for {kind} rule #{index}: {source}")]
    RulePattern {
        kind: ActionKind,
        index: usize,
        #[source]
        source: regex::Error,
    },

    /// A rule pattern names a capture group outside its kind's vocabulary.
    #[error("{kind} rule #{index} captures unknown field '{name}'")]
    UnknownCapture { kind: ActionKind, index: usize, name: String },

    /// The content tree handed to the engine is structurally broken.
    #[error("invalid content tree: {0}")]
    InvalidTree(String),
}

/// Why one bill of a batch produced no output.
#[derive(Error, Debug)]
pub enum BillError {
    #[error(transparent)]
    Load(#[from] Error),

    #[error("panicked: {0}")]
    Panicked(String),
}

/// Failure while applying one action. Never fatal for the bill.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    #[error("no node at {path}")]
    TargetMissing { path: String },

    #[error("{count} nodes at {path}")]
    TargetAmbiguous { path: String, count: usize },

    #[error("missing captured field '{0}'")]
    MissingField(&'static str),

    #[error("no quoted block under bill node {0}")]
    NoQuotedBlock(NodeId),

    #[error("label '{old}' not found in '{label}'")]
    LabelMismatch { old: String, label: String },

    #[error("no room to order {count} new siblings after node {anchor}")]
    OrderExhausted { anchor: NodeId, count: usize },

    #[error("cannot parse label from '{0}'")]
    BadLabel(String),

    /// The applier panicked. Caught at the action boundary.
    #[error("applier panicked: {0}")]
    Panicked(String),
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
