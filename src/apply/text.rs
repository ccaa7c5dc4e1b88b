//! In-place text edits.
//!
//! Matching is on word boundaries so striking "tax" leaves "taxpayer" alone.
//! Search text whose first or last character is not a word character, or
//! that contains `$ § % ( ) [ ]`, cannot be bounded that way and is matched
//! literally instead.

use super::{required, Clause, Field};
use crate::action::field;
use crate::error::ApplyError;
use crate::overlay::{DiffRecord, OverlayView};
use crate::tree::CodeLookup;
use crate::Action;
use regex::Regex;
use std::ops::Range;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Placement {
    After,
    Before,
}

fn boundary_safe(needle: &str) -> bool {
    let word = |c: char| c.is_alphanumeric() || c == '_';
    match (needle.chars().next(), needle.chars().last()) {
        (Some(first), Some(last)) => word(first) && word(last) && !needle.contains(['$', '§', '%', '(', ')', '[', ']']),
        _ => false,
    }
}

/// Byte ranges of the first (or every) occurrence of `needle`.
fn occurrences(haystack: &str, needle: &str, every: bool) -> Vec<Range<usize>> {
    if needle.is_empty() {
        return Vec::new();
    }
    let limit = if every { usize::MAX } else { 1 };
    if boundary_safe(needle) {
        match Regex::new(&format!(r"\b{}\b", regex::escape(needle))) {
            Ok(pattern) => pattern.find_iter(haystack).take(limit).map(|m| m.range()).collect(),
            Err(_) => Vec::new(),
        }
    } else {
        haystack.match_indices(needle).take(limit).map(|(i, m)| i..i + m.len()).collect()
    }
}

/// Whether `needle` occurs in `haystack` under the same matching rules
/// [`substitute`] uses.
pub(super) fn occurs(haystack: &str, needle: &str) -> bool {
    !occurrences(haystack, needle, false).is_empty()
}

/// Replace the first (or every) occurrence of `needle`. `None` when nothing
/// matched or the text does not change.
///
/// A removal closes the gap it leaves at the splice point and nowhere else.
pub(super) fn substitute(haystack: &str, needle: &str, replacement: &str, every: bool) -> Option<String> {
    let ranges = occurrences(haystack, needle, every);
    if ranges.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(haystack.len() + replacement.len());
    let mut last = 0;
    for range in ranges {
        out.push_str(haystack.get(last..range.start).unwrap_or(""));
        out.push_str(replacement);
        last = range.end.max(last);
        if replacement.is_empty() {
            let rest = &haystack[last..];
            if (out.is_empty() || out.ends_with(' ')) && rest.starts_with(' ') {
                last += 1;
            } else if out.ends_with(' ') && (rest.is_empty() || rest.starts_with([',', '.', ';', ':'])) {
                out.pop();
            }
        }
    }
    out.push_str(&haystack[last..]);
    (out != haystack).then_some(out)
}

/// `StrikeText`: remove or replace a phrase.
pub(super) fn strike_text<L: CodeLookup + ?Sized>(
    view: &mut OverlayView<'_, L>,
    clause: &Clause<'_>,
    action: &Action,
) -> Result<Vec<DiffRecord>, ApplyError> {
    let needle = required(action, field::TO_REMOVE_TEXT)?;
    let replacement = action.field(field::TO_REPLACE).unwrap_or("");
    let every = action.field(field::EACH_PLACE).is_some();

    let mut node = view.find(&clause.citation.path)?;
    let Some(target) = Field::pick(&node, needle) else {
        debug!(path = %node.citation_path, needle, "strike text not present");
        return Ok(Vec::new());
    };
    let Some(updated) = substitute(target.get(&node), needle, replacement, every) else {
        return Ok(Vec::new());
    };
    target.set(&mut node, updated);
    Ok(view.write(node).into_iter().collect())
}

/// `StrikeEnd`: swap the punctuation mark or word that closes the text.
pub(super) fn strike_end<L: CodeLookup + ?Sized>(
    view: &mut OverlayView<'_, L>,
    clause: &Clause<'_>,
    action: &Action,
) -> Result<Vec<DiffRecord>, ApplyError> {
    let spelled = required(action, field::TO_REMOVE_TEXT)?;
    let replacement = action.field(field::TO_REPLACE).unwrap_or("");
    let token = match spelled.to_ascii_lowercase().as_str() {
        "period" => ".".to_string(),
        "semicolon" => ";".to_string(),
        "comma" => ",".to_string(),
        "colon" => ":".to_string(),
        _ => spelled.trim_matches('"').to_string(),
    };
    let is_word = token.chars().last().is_some_and(char::is_alphanumeric);

    let mut node = view.find(&clause.citation.path)?;
    let ends_with_token = |text: &str| {
        let text = text.trim_end();
        text.strip_suffix(token.as_str())
            .is_some_and(|rest| !is_word || !rest.chars().last().is_some_and(char::is_alphanumeric))
    };
    let target = if ends_with_token(node.body()) {
        Field::Body
    } else if node.heading.as_deref().is_some_and(ends_with_token) {
        Field::Heading
    } else {
        debug!(path = %node.citation_path, %token, "text does not end with token");
        return Ok(Vec::new());
    };

    let text = target.get(&node).trim_end();
    let mut updated = text[..text.len() - token.len()].to_string();
    if is_word {
        updated.truncate(updated.trim_end().len());
    }
    if !replacement.is_empty() && replacement.starts_with(char::is_alphanumeric) && !updated.is_empty() {
        updated.push(' ');
    }
    updated.push_str(replacement);
    target.set(&mut node, updated);
    Ok(view.write(node).into_iter().collect())
}

/// `InsertTextAfter` / `InsertTextBefore`: add text next to an anchor phrase.
pub(super) fn insert_text<L: CodeLookup + ?Sized>(
    view: &mut OverlayView<'_, L>,
    clause: &Clause<'_>,
    action: &Action,
    placement: Placement,
) -> Result<Vec<DiffRecord>, ApplyError> {
    let anchor = required(action, field::ANCHOR_TEXT)?;
    let insert = required(action, field::TO_INSERT_TEXT)?;
    let every = action.field(field::EACH_PLACE).is_some();

    let mut node = view.find(&clause.citation.path)?;
    let Some(target) = Field::pick(&node, anchor) else {
        debug!(path = %node.citation_path, anchor, "anchor text not present");
        return Ok(Vec::new());
    };
    let combined = match placement {
        Placement::After if insert.starts_with(char::is_alphanumeric) => format!("{anchor} {insert}"),
        Placement::After => format!("{anchor}{insert}"),
        Placement::Before if insert.ends_with(char::is_alphanumeric) => format!("{insert} {anchor}"),
        Placement::Before => format!("{insert}{anchor}"),
    };
    let Some(updated) = substitute(target.get(&node), anchor, &combined, every) else {
        return Ok(Vec::new());
    };
    target.set(&mut node, updated);
    Ok(view.write(node).into_iter().collect())
}

/// Append `text` to the body, or to the heading of a node without one.
pub(super) fn append_text<L: CodeLookup + ?Sized>(
    view: &mut OverlayView<'_, L>,
    path: &str,
    text: &str,
) -> Result<Vec<DiffRecord>, ApplyError> {
    let mut node = view.find(path)?;
    let target = if node.body_text.is_some() || node.heading.is_none() { Field::Body } else { Field::Heading };
    let current = target.get(&node);

    let mut updated = current.to_string();
    let joins_directly = text.starts_with([',', '.', ';', ':', ')']) || text.starts_with(char::is_whitespace);
    if !updated.is_empty() && !updated.ends_with(char::is_whitespace) && !joins_directly {
        updated.push(' ');
    }
    updated.push_str(text);
    target.set(&mut node, updated);
    Ok(view.write(node).into_iter().collect())
}

/// `InsertTextEnd`: append a quoted phrase.
pub(super) fn insert_text_end<L: CodeLookup + ?Sized>(
    view: &mut OverlayView<'_, L>,
    clause: &Clause<'_>,
    action: &Action,
) -> Result<Vec<DiffRecord>, ApplyError> {
    let text = required(action, field::TO_INSERT_TEXT)?;
    append_text(view, &clause.citation.path, text)
}
