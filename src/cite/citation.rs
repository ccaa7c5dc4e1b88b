use serde::{Deserialize, Serialize};

/// Root every code citation path starts from.
pub const USC_ROOT: &str = "/us/usc";

/// Structural level a partial citation starts at.
///
/// Discriminants are depths below the section, which is what merging needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Level {
    Section = 0,
    Subsection = 1,
    Paragraph = 2,
    Subparagraph = 3,
    Clause = 4,
    Subclause = 5,
    Item = 6,
    Subitem = 7,
}

impl Level {
    /// `"paragraph"`, `"Paragraphs"`, `"subsection"` ...
    pub fn from_word(word: &str) -> Option<Level> {
        let word = word.trim().to_ascii_lowercase();
        let singular = match word.as_str() {
            w if Self::parse_singular(w).is_some() => w,
            w => w.strip_suffix('s')?,
        };
        Self::parse_singular(singular)
    }

    fn parse_singular(word: &str) -> Option<Level> {
        Some(match word {
            "section" => Level::Section,
            "subsection" => Level::Subsection,
            "paragraph" => Level::Paragraph,
            "subparagraph" => Level::Subparagraph,
            "clause" => Level::Clause,
            "subclause" => Level::Subclause,
            "item" => Level::Item,
            "subitem" => Level::Subitem,
            _ => return None,
        })
    }

    fn depth(self) -> usize {
        self as usize
    }
}

/// A reference into the code, either anchored at the code root (`complete`)
/// or a suffix that needs an ancestor's citation to mean anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub raw_text: String,
    /// Absolute (`/us/usc/t5/s101/a`) when complete, relative (`a/1`) when not.
    pub path: String,
    pub complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
}

impl Citation {
    pub fn complete(raw_text: &str, path: String) -> Self {
        Citation { raw_text: raw_text.to_string(), path, complete: true, level: None }
    }

    pub fn partial(raw_text: &str, path: String, level: Option<Level>) -> Self {
        Citation { raw_text: raw_text.to_string(), path, complete: false, level }
    }

    /// Attach a partial citation to a complete ancestor.
    ///
    /// The partial's level decides where it hangs: a subsection goes right
    /// under the ancestor's section, a paragraph under its subsection, and so
    /// on. Without a level (or a section in the ancestor) it is appended.
    ///
    /// ```text
    /// "/us/usc/t5/s101/a/3"  +  paragraph "5"   ->  "/us/usc/t5/s101/a/5"
    /// "/us/usc/t42/s1395"    +  subsection "b"  ->  "/us/usc/t42/s1395/b"
    /// "/us/usc/t42/s1395/b"  +  section "s7"    ->  "/us/usc/t42/s7"
    /// ```
    pub fn merge_onto(&self, ancestor: &Citation) -> Citation {
        if self.complete {
            return self.clone();
        }
        let segments: Vec<&str> = ancestor.path.trim_end_matches('/').split('/').collect();
        let keep = match self.level {
            Some(Level::Section) => title_index(&segments).map(|t| t + 1),
            Some(level) => section_index(&segments).map(|s| s + level.depth()),
            None => None,
        }
        .unwrap_or(segments.len())
        .min(segments.len());

        let mut path = segments[..keep].join("/");
        if !self.path.is_empty() {
            path.push('/');
            path.push_str(self.path.trim_start_matches('/'));
        }
        Citation { raw_text: self.raw_text.clone(), path, complete: true, level: None }
    }

    /// Whether the path starts at a title of the code.
    pub fn is_anchored(&self) -> bool {
        self.complete && self.title().is_some()
    }

    /// Title number of a complete citation, e.g. `"42"`.
    pub fn title(&self) -> Option<&str> {
        let rest = self.path.strip_prefix(USC_ROOT)?.strip_prefix("/t")?;
        let title = rest.split('/').next()?;
        (!title.is_empty() && title.chars().all(|c| c.is_ascii_alphanumeric())
            && title.starts_with(|c: char| c.is_ascii_digit()))
        .then_some(title)
    }
}

fn title_index(segments: &[&str]) -> Option<usize> {
    segments.iter().position(|s| is_numbered(s, "t"))
}

fn section_index(segments: &[&str]) -> Option<usize> {
    let title = title_index(segments)?;
    segments.iter().skip(title + 1).position(|s| is_numbered(s, "s")).map(|i| i + title + 1)
}

fn is_numbered(segment: &str, prefix: &str) -> bool {
    segment.strip_prefix(prefix).is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
}

/// `"(a)(1)(B)"` -> `["a", "1", "B"]`.
pub fn paren_segments(text: &str) -> Vec<String> {
    regex!(r"\(([A-Za-z0-9]+)\)").captures_iter(text).map(|c| c[1].to_string()).collect()
}

/// Relative path for one chain at `level`: `"1395(b)"` as a section is
/// `"s1395/b"`, `"(2)(A)"` as a paragraph is `"2/A"`.
pub fn chain_path(level: Level, chain: &str) -> String {
    let chain = chain.trim();
    let lead = chain.split('(').next().unwrap_or("").trim();
    let mut segments = Vec::new();
    if !lead.is_empty() {
        segments.push(if level == Level::Section { format!("s{lead}") } else { lead.to_string() });
    }
    segments.extend(paren_segments(&chain[lead.len()..]));
    segments.join("/")
}

/// Split a target phrase into its level and the chains it lists.
///
/// `"paragraphs (3) and (4)"` -> `(Paragraph, ["(3)", "(4)"])`.
pub fn target_chains(target: &str) -> Option<(Level, Vec<String>)> {
    let caps = regex!(r"(?i)^\s*((?:sub)?(?:section|paragraph|clause|item)s?)\s+(.*)$").captures(target)?;
    let level = Level::from_word(&caps[1])?;
    let chains: Vec<String> = regex!(r"[0-9]+[A-Za-z0-9-]*(?:\([A-Za-z0-9]+\))*|(?:\([A-Za-z0-9]+\))+")
        .find_iter(&caps[2])
        .map(|m| m.as_str().to_string())
        .collect();
    (!chains.is_empty()).then_some((level, chains))
}

/// Absolute paths a `target` capture names, relative to `base`.
///
/// An unparseable target yields `base` itself.
pub fn target_paths(base: &Citation, target: &str) -> Vec<String> {
    match target_chains(target) {
        Some((level, chains)) => chains
            .iter()
            .map(|chain| Citation::partial(target, chain_path(level, chain), Some(level)).merge_onto(base).path)
            .collect(),
        None => vec![base.path.clone()],
    }
}
