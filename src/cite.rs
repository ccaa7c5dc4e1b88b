//! Citation resolution.
//!
//! Turns the free text of a bill clause into paths into the code tree:
//!
//! - [`Citation`]: a resolved (or partial) reference and the level arithmetic
//!   used to anchor partial references on an ancestor's path.
//! - [`TraversalContext`]: per-bill memory of what earlier clauses resolved
//!   to. One per bill; never shared.
//! - [`resolve`]: the extraction strategies, tried in a fixed order.

#[path = "cite/citation.rs"]
mod citation;
#[path = "cite/context.rs"]
mod context;
#[path = "cite/resolver.rs"]
mod resolver;

pub use citation::{chain_path, paren_segments, target_chains, target_paths, Citation, Level, USC_ROOT};
pub use context::{NodePath, TraversalContext};
pub use resolver::resolve;
