//! Clause text canonicalization.
//!
//! Rules are written against one canonical spelling of each clause, so every
//! text-bearing node goes through [`normalize`] before classification:
//!
//! ```text
//! "is amended--\n  (1)  by striking “Secretaría”"
//!        │ strip markup, fold accents, straighten quotes
//!        │ collapse "--" / em / en dashes to "—", squeeze whitespace
//!        v
//! "is amended—(1) by striking \"Secretaria\""
//! ```
//!
//! The citation resolver deliberately sees the raw text instead, because it
//! reads the cross-reference markup that this pass removes.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Accented Latin letters that show up in statutory text, folded to ASCII.
static ACCENT_FOLDS: Lazy<HashMap<char, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ('à', "a"),
        ('á', "a"),
        ('â', "a"),
        ('ã', "a"),
        ('ä', "a"),
        ('å', "a"),
        ('À', "A"),
        ('Á', "A"),
        ('Â', "A"),
        ('Ã', "A"),
        ('Ä', "A"),
        ('Å', "A"),
        ('æ', "ae"),
        ('Æ', "AE"),
        ('ç', "c"),
        ('Ç', "C"),
        ('è', "e"),
        ('é', "e"),
        ('ê', "e"),
        ('ë', "e"),
        ('È', "E"),
        ('É', "E"),
        ('Ê', "E"),
        ('Ë', "E"),
        ('ì', "i"),
        ('í', "i"),
        ('î', "i"),
        ('ï', "i"),
        ('Ì', "I"),
        ('Í', "I"),
        ('Î', "I"),
        ('Ï', "I"),
        ('ñ', "n"),
        ('Ñ', "N"),
        ('ò', "o"),
        ('ó', "o"),
        ('ô', "o"),
        ('õ', "o"),
        ('ö', "o"),
        ('ø', "o"),
        ('Ò', "O"),
        ('Ó', "O"),
        ('Ô', "O"),
        ('Õ', "O"),
        ('Ö', "O"),
        ('Ø', "O"),
        ('ù', "u"),
        ('ú', "u"),
        ('û', "u"),
        ('ü', "u"),
        ('Ù', "U"),
        ('Ú', "U"),
        ('Û', "U"),
        ('Ü', "U"),
        ('ý', "y"),
        ('ÿ', "y"),
        ('Ý', "Y"),
        ('ß', "ss"),
    ])
});

/// Full canonicalization used before classification.
pub fn normalize(text: &str) -> String {
    let stripped = strip_markup(text);
    let folded = fold_accents(&stripped);
    let quoted = straighten_quotes(&folded);
    let dashed = collapse_dashes(&quoted);
    squeeze_whitespace(&dashed)
}

/// Remove inline tags, keeping the text between them.
pub fn strip_markup(text: &str) -> String {
    regex!(r"</?[A-Za-z][A-Za-z0-9:_-]*(?:\s[^<>]*)?/?>").replace_all(text, "").into_owned()
}

pub fn fold_accents(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match ACCENT_FOLDS.get(&c) {
            Some(folded) => out.push_str(folded),
            None => out.push(c),
        }
    }
    out
}

/// Curly double quotes and `''`/` `` ` pairs become `"`; curly singles become `'`.
pub fn straighten_quotes(text: &str) -> String {
    let text = text.replace("``", "\"").replace("''", "\"");
    text.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => '\'',
            other => other,
        })
        .collect()
}

/// Em dashes, en dashes and the `--` that transliteration leaves behind all
/// become a single `—`. A lone hyphen (as in `1395w-4`) is untouched.
pub fn collapse_dashes(text: &str) -> String {
    regex!(r"\s*(?:-{2,}|[\u{2013}\u{2014}]+)\s*").replace_all(text, "—").into_owned()
}

pub fn squeeze_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_transliterated_dashes() {
        assert_eq!(normalize("is amended--"), "is amended—");
        assert_eq!(normalize("is amended -- (1)"), "is amended—(1)");
        assert_eq!(normalize("is amended\u{2014}"), "is amended—");
        assert_eq!(normalize("section 1395w-4"), "section 1395w-4");
    }

    #[test]
    fn folds_accents_and_quotes() {
        assert_eq!(normalize("by striking “Secretaría”"), "by striking \"Secretaria\"");
        assert_eq!(normalize("by striking ``Attorney General''"), "by striking \"Attorney General\"");
        assert_eq!(normalize("the Secretary’s"), "the Secretary's");
    }

    #[test]
    fn strips_cross_reference_markup() {
        let raw = r#"section 1862 (<external-xref legal-doc="usc" parsable-cite="usc/42/1395y">42 U.S.C. 1395y</external-xref>)"#;
        assert_eq!(normalize(raw), "section 1862 (42 U.S.C. 1395y)");
    }

    #[test]
    fn squeezes_whitespace() {
        assert_eq!(normalize("  by\n\tstriking   \"x\"  "), "by striking \"x\"");
    }
}
