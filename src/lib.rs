//! Legislative amendment engine.
//!
//! Reads the clauses of a bill ("Section 101(a) of title 5, United States
//! Code, is amended by striking ...") and turns them into versioned,
//! field-level diffs over an authoritative legal-code tree.
//!
//! ```text
//! bill tree ── Walker ──┬── classify (RuleTable)   what kind of edit
//!                       ├── resolve  (cite)        where in the code
//!                       └── apply    (appliers)    DiffRecords over an OverlayView
//!                                                        │
//!                                                        v
//!                                                   DiffOverlay
//! ```
//!
//! Nothing is ever written to the authoritative tree. Every edit is a
//! [`DiffRecord`] keyed by node and version; readers fold the records of a
//! version in append order to see the amended text.
//!
//! The crate is deterministic: the same rules, code and bill always produce
//! the same records.

#[macro_use]
mod macros;

mod action;
mod api;
pub mod apply;
pub mod batch;
pub mod cite;
pub mod classify;
pub mod config;
pub mod effective_date;
mod error;
pub mod normalize;
pub mod overlay;
pub mod tree;
pub mod walk;

pub use action::{field, Action, ActionKind, ActionRecord, Actions, CapturedFields};
pub use api::{apply_bill, classify, classify_verbose, classify_verbose_with, default_rules, ClassifyDetails};
pub use batch::{run_batch, BatchOptions, BillJob, BillOutcome, BillSource};
pub use cite::{Citation, TraversalContext};
pub use classify::{Cue, RuleSpec, RuleTable};
pub use config::EngineConfig;
pub use error::{ApplyError, BillError, Error, Result};
pub use overlay::{DiffOverlay, DiffRecord, OverlayView};
pub use tree::{CodeLookup, ContentNode, ContentTree, NodeId, NodeKind, TreeBuilder, TreeRecords, VersionId};
pub use walk::{WalkMetrics, WalkOptions, WalkOutput, Walker};
