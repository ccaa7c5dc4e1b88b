use super::Citation;
use std::collections::HashMap;

/// Position of a bill node: sibling indexes from the bill root down.
pub type NodePath = Vec<usize>;

/// Per-bill resolution state.
///
/// Holds the effective citation recorded at each visited node and the title
/// most recently named in full, which `section X of such title` refers back
/// to. One context per bill: sharing it between bills leaks one bill's
/// `last_title` into the other.
#[derive(Debug, Clone, Default)]
pub struct TraversalContext {
    records: HashMap<NodePath, Citation>,
    last_title: Option<String>,
}

impl TraversalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, path: &[usize], citation: Citation) {
        self.records.insert(path.to_vec(), citation);
    }

    pub fn citation_at(&self, path: &[usize]) -> Option<&Citation> {
        self.records.get(path)
    }

    /// Nearest complete citation recorded on a strict ancestor of `path`.
    pub fn lookup_ancestor_citation(&self, path: &[usize]) -> Option<&Citation> {
        (1..path.len()).rev().filter_map(|len| self.records.get(&path[..len])).find(|c| c.complete)
    }

    pub fn last_title(&self) -> Option<&str> {
        self.last_title.as_deref()
    }

    pub fn set_last_title(&mut self, title: &str) {
        self.last_title = Some(title.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancestor_lookup_skips_partials_and_self() {
        let mut ctx = TraversalContext::new();
        ctx.record(&[0], Citation::complete("section 5", "/us/usc/t5/s5".into()));
        ctx.record(&[0, 1], Citation::partial("subsection (a)", "a".into(), None));
        ctx.record(&[0, 1, 2], Citation::complete("x", "/us/usc/t5/s5/a/2".into()));

        assert_eq!(ctx.lookup_ancestor_citation(&[0, 1, 2]).map(|c| c.path.as_str()), Some("/us/usc/t5/s5"));
        assert_eq!(ctx.lookup_ancestor_citation(&[0, 1, 2, 0]).map(|c| c.path.as_str()), Some("/us/usc/t5/s5/a/2"));
        assert!(ctx.lookup_ancestor_citation(&[0]).is_none());
        assert!(ctx.lookup_ancestor_citation(&[1, 0]).is_none());
    }
}
