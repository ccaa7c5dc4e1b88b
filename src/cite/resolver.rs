//! Citation strategies, tried in priority order. The first one that produces
//! anything wins.
//!
//! ```text
//! 1. <external-xref legal-doc="usc" parsable-cite="usc/42/1395/b">   complete, all of them
//! 2. 42 U.S.C. 1395(b) [... clause (ii)]                              complete
//! 3. [subsection (z) of] section X(y) of title N, United States Code  complete
//!    title N, United States Code, is amended in section X            complete
//!    title N, United States Code                                      complete
//! 4. [subsection (z) of] section X of such title                      complete via last_title
//! 5. section X(y) / subsection (a)(1)                                 partial
//! ```
//!
//! Strategy 1 reads the raw text. The others read the normalized text with
//! quoted spans blanked out, so an amendment payload such as
//! `striking "section 5"` never resolves.

use super::citation::{chain_path, paren_segments, Citation, Level, USC_ROOT};
use super::TraversalContext;
use crate::normalize::normalize;
use regex::Captures;

/// Resolve every citation `text` carries, updating `ctx.last_title` on each
/// complete hit.
pub fn resolve(text: &str, ctx: &mut TraversalContext) -> Vec<Citation> {
    let mut found = from_xref(text);
    if found.is_empty() {
        let masked = mask_quotes(&normalize(text));
        found = from_usc_cite(&masked)
            .or_else(|| from_title_code(&masked))
            .map(|c| vec![c])
            .unwrap_or_default();
        if found.is_empty() {
            match from_such_title(&masked, ctx) {
                // Named "such title" with nothing to anchor it: unresolvable.
                Some(None) => return Vec::new(),
                Some(Some(c)) => found.push(c),
                None => found.extend(from_bare_section(&masked).or_else(|| from_bare_level(&masked))),
            }
        }
    }

    for citation in &found {
        if let Some(title) = citation.title() {
            ctx.set_last_title(title);
        }
    }
    found
}

fn mask_quotes(text: &str) -> String {
    regex!(r#""[^"]*""#).replace_all(text, "\"\"").into_owned()
}

fn from_xref(text: &str) -> Vec<Citation> {
    let mut out = Vec::new();
    for tag in regex!(r"(?i)<external-xref\b[^>]*>").find_iter(text) {
        let tag = tag.as_str();
        if !regex!(r#"(?i)\blegal-doc\s*=\s*"usc""#).is_match(tag) {
            continue;
        }
        let Some(cite) = regex!(r#"(?i)\bparsable-cite\s*=\s*"usc/([^"]+)""#).captures(tag) else {
            continue;
        };
        let mut parts = cite[1].split('/').filter(|p| !p.is_empty());
        let (Some(title), Some(section)) = (parts.next(), parts.next()) else {
            continue;
        };
        let mut path = format!("{USC_ROOT}/t{title}/s{section}");
        for part in parts {
            path.push('/');
            path.push_str(part);
        }
        out.push(Citation::complete(tag, path));
    }
    out
}

fn section_path(title: &str, section: &str, subs: &str) -> String {
    let mut path = format!("{USC_ROOT}/t{title}/{}", chain_path(Level::Section, section));
    for seg in paren_segments(subs) {
        path.push('/');
        path.push_str(&seg);
    }
    path
}

/// `subsection (z) of` prefix, appended below the section.
fn push_prefix(path: &mut String, caps: &Captures, group: &str) {
    if let Some(prefix) = caps.name(group) {
        for seg in paren_segments(prefix.as_str()) {
            path.push('/');
            path.push_str(&seg);
        }
    }
}

fn from_usc_cite(text: &str) -> Option<Citation> {
    let caps = regex!(
        r"(?i)\b(?P<title>\d+)\s+U\.?\s?S\.?\s?C\.?\s+(?:§+\s*)?(?P<section>\d+[A-Za-z0-9-]*)(?P<subs>(?:\([A-Za-z0-9]+\))*)"
    )
    .captures(text)?;
    let whole = caps.get(0)?;
    let mut path = section_path(&caps["title"], &caps["section"], &caps["subs"]);

    let rest = &text[whole.end()..];
    if let Some(trailing) =
        regex!(r"(?i)\b(?:sub)?(?:section|paragraph|clause|item)\s+(?P<chain>(?:\([A-Za-z0-9]+\))+)").captures(rest)
    {
        for seg in paren_segments(&trailing["chain"]) {
            path.push('/');
            path.push_str(&seg);
        }
    }
    Some(Citation::complete(whole.as_str(), path))
}

fn from_title_code(text: &str) -> Option<Citation> {
    if let Some(caps) = regex!(
        r"(?i)(?:\b(?P<prefix>(?:sub)?(?:section|paragraph|clause|item)\s+(?:\([A-Za-z0-9]+\))+)\s+of\s+)?\bsection\s+(?P<section>\d+[A-Za-z0-9-]*)(?P<subs>(?:\([A-Za-z0-9]+\))*)\s+of\s+title\s+(?P<title>\d+)\s*,?\s+United\s+States\s+Code"
    )
    .captures(text)
    {
        let mut path = section_path(&caps["title"], &caps["section"], &caps["subs"]);
        push_prefix(&mut path, &caps, "prefix");
        return Some(Citation::complete(&caps[0], path));
    }

    if let Some(caps) = regex!(
        r"(?i)\btitle\s+(?P<title>\d+)\s*,?\s+United\s+States\s+Code\s*,?\s+(?:is\s+(?:further\s+)?amended\s+)?(?:in\s+)?section\s+(?P<section>\d+[A-Za-z0-9-]*)(?P<subs>(?:\([A-Za-z0-9]+\))*)"
    )
    .captures(text)
    {
        let path = section_path(&caps["title"], &caps["section"], &caps["subs"]);
        return Some(Citation::complete(&caps[0], path));
    }

    let caps = regex!(r"(?i)\btitle\s+(?P<title>\d+)\s*,?\s+United\s+States\s+Code").captures(text)?;
    Some(Citation::complete(&caps[0], format!("{USC_ROOT}/t{}", &caps["title"])))
}

/// `None`: not a such-title reference. `Some(None)`: one, but unanchored.
fn from_such_title(text: &str, ctx: &TraversalContext) -> Option<Option<Citation>> {
    let caps = regex!(
        r"(?i)(?:\b(?P<prefix>(?:sub)?(?:section|paragraph|clause|item)\s+(?:\([A-Za-z0-9]+\))+)\s+of\s+)?\bsection\s+(?P<section>\d+[A-Za-z0-9-]*)(?P<subs>(?:\([A-Za-z0-9]+\))*)\s+of\s+such\s+(?:title|Act)\b"
    )
    .captures(text)?;
    let Some(title) = ctx.last_title() else {
        return Some(None);
    };
    let mut path = section_path(title, &caps["section"], &caps["subs"]);
    push_prefix(&mut path, &caps, "prefix");
    Some(Some(Citation::complete(&caps[0], path)))
}

fn from_bare_section(text: &str) -> Option<Citation> {
    let caps = regex!(
        r"(?i)(?:\b(?P<prefix>(?:sub)?(?:section|paragraph|clause|item)\s+(?:\([A-Za-z0-9]+\))+)\s+of\s+)?\bsection\s+(?P<section>\d+[A-Za-z0-9-]*)(?P<subs>(?:\([A-Za-z0-9]+\))*)"
    )
    .captures(text)?;
    let whole = caps.get(0)?;
    // "section 5 of the Social Security Act" points outside the code.
    if regex!(r"(?i)^\s*of\b").is_match(&text[whole.end()..]) {
        return None;
    }
    let mut path = chain_path(Level::Section, &format!("{}{}", &caps["section"], &caps["subs"]));
    push_prefix(&mut path, &caps, "prefix");
    Some(Citation::partial(whole.as_str(), path, Some(Level::Section)))
}

fn from_bare_level(text: &str) -> Option<Citation> {
    let caps =
        regex!(r"(?i)\b(?P<level>(?:sub)?(?:section|paragraph|clause|item))s?\s+(?P<chain>(?:\([A-Za-z0-9]+\))+)")
            .captures(text)?;
    let level = Level::from_word(&caps["level"])?;
    Some(Citation::partial(&caps[0], paren_segments(&caps["chain"]).join("/"), Some(level)))
}
