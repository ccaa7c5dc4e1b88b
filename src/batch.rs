//! Batch runs: many bills against one version of the code.
//!
//! Each bill is one rayon task with its own [`TraversalContext`] (created by
//! [`Walker::walk`]) and its own output version, so no two bills ever write
//! the same [`DiffOverlay`] partition. A bill that fails to load, or panics
//! outside a single action, is reported in its own [`BillOutcome`]; the rest
//! of the batch carries on. Successful walks are committed to the shared
//! store as one append per bill.
//!
//! ```text
//! job 0 ── walk ── version v      (v = BatchOptions.walk.version_id)
//! job 1 ── walk ── version v + 1
//! job 2 ── walk ── version 40     (BillJob::version(VersionId(40)))
//! ```
//!
//! [`TraversalContext`]: crate::cite::TraversalContext

use crate::error::{panic_message, BillError, Result};
use crate::overlay::DiffOverlay;
use crate::tree::CodeLookup;
use crate::walk::{WalkOptions, WalkOutput, Walker};
use crate::{ContentTree, RuleTable, VersionId};
use rayon::prelude::*;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use tracing::{error, info, info_span};

/// Where a bill's content tree comes from.
#[derive(Debug, Clone)]
pub enum BillSource {
    Tree(ContentTree),
    /// JSON interchange file, read inside the bill's task.
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct BillJob {
    pub name: String,
    pub source: BillSource,
    /// Output version. Unset means the batch numbers it by job position.
    pub version: Option<VersionId>,
}

impl BillJob {
    pub fn tree(name: impl Into<String>, tree: ContentTree) -> Self {
        BillJob { name: name.into(), source: BillSource::Tree(tree), version: None }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        BillJob { name: path.display().to_string(), source: BillSource::File(path), version: None }
    }

    pub fn version(mut self, version: VersionId) -> Self {
        self.version = Some(version);
        self
    }
}

#[derive(Debug)]
pub struct BillOutcome {
    pub name: String,
    /// Version the bill's diffs were written to.
    pub version_id: VersionId,
    pub result: std::result::Result<WalkOutput, BillError>,
}

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Shared walk settings. `walk.version_id` is the version of the first
    /// job; later jobs count up from it.
    pub walk: WalkOptions,
    /// Worker threads. `None` uses rayon's global pool.
    pub workers: Option<usize>,
}

/// Walk every job in parallel. Outcomes come back in job order.
///
/// Only a failure to build the worker pool is an error here; per-bill
/// failures are in the outcomes.
pub fn run_batch<L>(
    rules: &RuleTable,
    lookup: &L,
    jobs: Vec<BillJob>,
    options: BatchOptions,
    store: &DiffOverlay,
) -> Result<Vec<BillOutcome>>
where
    L: CodeLookup + Sync + ?Sized,
{
    let run = || {
        jobs.into_par_iter()
            .enumerate()
            .map(|(index, job)| {
                let version_id = job.version.unwrap_or_else(|| job_version(options.walk.version_id, index));
                let walker = Walker::new(rules, lookup, WalkOptions { version_id, ..options.walk });
                run_one(&walker, version_id, job, store)
            })
            .collect::<Vec<_>>()
    };

    let outcomes = match options.workers {
        Some(n) => rayon::ThreadPoolBuilder::new().num_threads(n).build()?.install(run),
        None => run(),
    };

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    info!(bills = outcomes.len(), failed, "batch finished");
    Ok(outcomes)
}

fn job_version(first: VersionId, index: usize) -> VersionId {
    VersionId(first.0 + index as u64)
}

fn run_one<L: CodeLookup + ?Sized>(
    walker: &Walker<'_, L>,
    version_id: VersionId,
    job: BillJob,
    store: &DiffOverlay,
) -> BillOutcome {
    let BillJob { name, source, .. } = job;
    let span = info_span!("bill", name = %name, version = %version_id);
    let _enter = span.enter();

    let result = catch_unwind(AssertUnwindSafe(|| -> std::result::Result<WalkOutput, BillError> {
        let bill = match source {
            BillSource::Tree(tree) => tree,
            BillSource::File(path) => ContentTree::load(&path)?,
        };
        Ok(walker.walk(&bill))
    }))
    .unwrap_or_else(|payload| Err(BillError::Panicked(panic_message(payload.as_ref()))));

    match &result {
        Ok(out) => {
            store.append(out.diffs.iter().cloned());
            let m = &out.metrics;
            info!(
                records = out.records.len(),
                diffs = m.diffs_emitted,
                inserted = m.nodes_inserted,
                unresolved = m.unresolved,
                failed = m.actions_failed,
                elapsed = ?m.total,
                "bill done"
            );
        }
        Err(err) => error!(%err, "bill failed"),
    }

    BillOutcome { name, version_id, result }
}
