//! Cue scanning (clause pre-classification).
//!
//! Before any rule runs, the clause is scanned once for a handful of keyword
//! stems. Each rule declares the cues its pattern cannot match without, and
//! the table skips rules whose cues are missing.
//!
//! ## Design notes
//!
//! - A cue must be a literal, case-insensitive substring of *every* string
//!   its rule can match. Under that condition gating only removes rules that
//!   would have failed anyway, so results are identical with or without it.
//! - False positives are fine ("adding" also fires on "padding"): the full
//!   pattern still has to match.
//! - The scan lowercases ASCII only; clauses are normalized before they get
//!   here, so accented letters are already folded.

bitflags::bitflags! {
    /// Keyword stems present in a clause.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Cue: u16 {
        const STRIKING      = 1 << 0;
        const INSERTING     = 1 << 1;
        const ADDING        = 1 << 2;
        const REDESIGNATING = 1 << 3;
        const REPEAL        = 1 << 4;
        const EFFECT        = 1 << 5;
        const AMEND         = 1 << 6;
        const TERM          = 1 << 7;
        const CITED         = 1 << 8;
        const AT_THE_END    = 1 << 9;
        const FOLLOWING     = 1 << 10;
    }
}

const STEMS: &[(&str, Cue)] = &[
    ("striking", Cue::STRIKING),
    ("inserting", Cue::INSERTING),
    ("adding", Cue::ADDING),
    ("redesignating", Cue::REDESIGNATING),
    ("repeal", Cue::REPEAL),
    ("effect", Cue::EFFECT),
    ("amend", Cue::AMEND),
    ("term", Cue::TERM),
    ("cited", Cue::CITED),
    ("at the end", Cue::AT_THE_END),
    ("following", Cue::FOLLOWING),
];

impl Cue {
    /// Scan `text` for every known stem.
    pub fn scan(text: &str) -> Cue {
        let lower = text.to_ascii_lowercase();
        let mut cues = Cue::empty();
        for &(stem, cue) in STEMS {
            if lower.contains(stem) {
                cues |= cue;
            }
        }
        cues
    }

    /// The literal stem behind a single cue flag.
    pub fn stem(self) -> Option<&'static str> {
        STEMS.iter().find(|(_, cue)| *cue == self).map(|(stem, _)| *stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_is_case_insensitive() {
        let cues = Cue::scan("Section 5 Is Amended by Striking \"x\" and Inserting \"y\"");
        assert!(cues.contains(Cue::AMEND | Cue::STRIKING | Cue::INSERTING));
        assert!(!cues.contains(Cue::REDESIGNATING));
    }

    #[test]
    fn multi_word_stems() {
        assert!(Cue::scan("by adding at the end the following:").contains(Cue::AT_THE_END | Cue::FOLLOWING));
        assert!(!Cue::scan("at the ending").is_empty());
        assert!(Cue::scan("").is_empty());
    }

    #[test]
    fn every_flag_has_a_stem() {
        for flag in Cue::all().iter() {
            assert!(flag.stem().is_some(), "{flag:?} has no stem");
        }
    }
}
