//! Effective-date arithmetic.
//!
//! `EFFECTIVE-DATE` actions capture an `amount` and a `unit` ("180 days",
//! "one year"). Given the enactment date, they resolve to a calendar date.
//! A clause with no period ("on the date of enactment") resolves to the
//! enactment date itself.

use crate::action::field;
use crate::CapturedFields;
use chrono::{Days, Months, NaiveDate};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Number words the effective-date rules accept.
static WORD_AMOUNTS: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    HashMap::from([
        ("one", 1),
        ("two", 2),
        ("three", 3),
        ("four", 4),
        ("five", 5),
        ("six", 6),
        ("seven", 7),
        ("eight", 8),
        ("nine", 9),
        ("ten", 10),
        ("eleven", 11),
        ("twelve", 12),
        ("fifteen", 15),
        ("eighteen", 18),
        ("twenty", 20),
        ("thirty", 30),
        ("forty-five", 45),
        ("sixty", 60),
        ("ninety", 90),
        ("one hundred twenty", 120),
        ("one hundred eighty", 180),
    ])
});

/// `"90"` -> 90, `"One  hundred eighty"` -> 180.
pub fn amount(text: &str) -> Option<u32> {
    let text = text.trim();
    if let Ok(n) = text.parse() {
        return Some(n);
    }
    let words = text.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase();
    WORD_AMOUNTS.get(words.as_str()).copied()
}

/// Calendar date an effective-date clause lands on.
///
/// Month arithmetic clamps to the end of shorter months (Jan 31 + 1 month is
/// the last day of February).
pub fn effective_on(fields: &CapturedFields, enacted_on: NaiveDate) -> Option<NaiveDate> {
    let (Some(amount_text), Some(unit)) = (fields.get(field::AMOUNT), fields.get(field::UNIT)) else {
        return Some(enacted_on);
    };
    let n = amount(amount_text)?;
    let unit = unit.to_ascii_lowercase();
    if unit.starts_with("day") {
        enacted_on.checked_add_days(Days::new(u64::from(n)))
    } else if unit.starts_with("month") {
        enacted_on.checked_add_months(Months::new(n))
    } else if unit.starts_with("year") {
        enacted_on.checked_add_months(Months::new(n.checked_mul(12)?))
    } else {
        None
    }
}
