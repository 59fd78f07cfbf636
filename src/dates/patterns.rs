//! Declarative date-pattern descriptors.
//!
//! Every date dialect the normalizer understands is one [`DatePattern`]: a
//! regex plus an interpretation rule for its captured groups. Adding a new
//! dialect is a data change — append a descriptor — not a new code branch.
//! Built-ins are ordered most-specific first; a per-site primary pattern is
//! declared in configuration as a [`PatternSpec`] and tried before them.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::errors::ScrapeError;

/// How a pattern's captured groups map onto a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupOrder {
    /// (era name, year-in-era, month, day); "元" is year 1.
    EraYmd,
    Ymd,
    Mdy,
    Dmy,
    /// Two groups, exactly one of which is 4 digits — that one is the year,
    /// the other the month; the day defaults to 1.
    YearMonth,
}

/// Month-name table used when a month group carries a name, not a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthNames {
    /// English, short and long forms, case-insensitive.
    English,
}

/// Japanese imperial eras by Gregorian start year.
const JAPANESE_ERAS: &[(&str, i32)] = &[("令和", 2019), ("平成", 1989), ("昭和", 1926)];

const MONTHS_LONG: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Case-insensitive English month lookup. Exact long names are tried first
/// so the longer form always wins; abbreviations of at least three letters
/// ("aug", "sept") resolve by prefix.
fn month_number(raw: &str) -> Option<u32> {
    let name = raw.trim_end_matches('.').to_ascii_lowercase();
    for (i, long) in MONTHS_LONG.iter().enumerate() {
        if name == *long {
            return Some(i as u32 + 1);
        }
    }
    if name.len() < 3 {
        return None;
    }
    for (i, long) in MONTHS_LONG.iter().enumerate() {
        if long.starts_with(&name) {
            return Some(i as u32 + 1);
        }
    }
    None
}

/// Strip every non-digit and parse what remains, so "05日" and "８月" (after
/// width folding) both come out as plain numbers.
fn num(raw: &str) -> Option<i64> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Two-digit Western years are treated as 2000-2099.
fn coerce_year(year: i64) -> i32 {
    if year < 100 {
        (year + 2000) as i32
    } else {
        year as i32
    }
}

fn ymd(year: i32, month: i64, day: i64) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// One date dialect: a regex and the rule for reading its groups.
#[derive(Debug, Clone)]
pub struct DatePattern {
    name: String,
    regex: Regex,
    order: Option<GroupOrder>,
    months: Option<MonthNames>,
    eras: Option<&'static [(&'static str, i32)]>,
}

impl DatePattern {
    fn new(
        name: &str,
        regex: &str,
        order: Option<GroupOrder>,
        months: Option<MonthNames>,
        eras: Option<&'static [(&'static str, i32)]>,
    ) -> Self {
        DatePattern {
            name: name.to_string(),
            regex: Regex::new(regex).expect("builtin date pattern"),
            order,
            months,
            eras,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn regex_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Match this pattern against already-folded text and interpret the
    /// captures. `None` covers both "regex did not match" and "matched but
    /// the groups do not form a real calendar date" — either way the caller
    /// moves on to the next candidate.
    pub fn try_extract(&self, text: &str) -> Option<NaiveDate> {
        let caps = self.regex.captures(text)?;
        let groups: Vec<&str> = caps
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty())
            .collect();
        self.resolve(&groups)
    }

    fn resolve(&self, groups: &[&str]) -> Option<NaiveDate> {
        match self.order {
            Some(GroupOrder::EraYmd) => {
                if groups.len() != 4 {
                    return None;
                }
                let start = era_start(self.eras?, groups[0])?;
                let nth = if groups[1] == "元" { 1 } else { num(groups[1])? };
                ymd(start + nth as i32 - 1, num(groups[2])?, num(groups[3])?)
            }
            Some(GroupOrder::Ymd) => {
                if groups.len() != 3 {
                    return None;
                }
                ymd(coerce_year(num(groups[0])?), num(groups[1])?, num(groups[2])?)
            }
            Some(GroupOrder::Mdy) => {
                if groups.len() != 3 {
                    return None;
                }
                ymd(
                    coerce_year(num(groups[2])?),
                    self.month_of(groups[0])? as i64,
                    num(groups[1])?,
                )
            }
            Some(GroupOrder::Dmy) => {
                if groups.len() != 3 {
                    return None;
                }
                ymd(
                    coerce_year(num(groups[2])?),
                    self.month_of(groups[1])? as i64,
                    num(groups[0])?,
                )
            }
            Some(GroupOrder::YearMonth) => {
                if groups.len() != 2 {
                    return None;
                }
                year_month(num(groups[0])?, num(groups[1])?)
            }
            None => interpret_loose(groups),
        }
    }

    fn month_of(&self, raw: &str) -> Option<u32> {
        match self.months {
            Some(MonthNames::English) => month_number(raw),
            None => num(raw).map(|v| v as u32),
        }
    }
}

fn era_start(eras: &[(&str, i32)], name: &str) -> Option<i32> {
    eras.iter()
        .find(|(era, _)| *era == name)
        .map(|(_, start)| *start)
}

/// The exactly-one-4-digit rule for year+month-only forms.
fn year_month(a: i64, b: i64) -> Option<NaiveDate> {
    let (year, month) = match (is_four_digit(a), is_four_digit(b)) {
        (true, false) => (a, b),
        (false, true) => (b, a),
        _ => return None,
    };
    ymd(year as i32, month, 1)
}

fn is_four_digit(n: i64) -> bool {
    (1000..10000).contains(&n)
}

/// Interpretation for caller-supplied patterns without a declared order.
///
/// A month name is never mistaken for a day or year, so a leading
/// alphabetic group claims the month slot (`Mon D, Y`). Otherwise three
/// numeric groups read as Y/M/D and two groups fall back to the
/// exactly-one-4-digit year+month rule.
fn interpret_loose(groups: &[&str]) -> Option<NaiveDate> {
    match groups.len() {
        3 => {
            if groups[0].chars().all(|c| c.is_ascii_alphabetic()) {
                ymd(
                    coerce_year(num(groups[2])?),
                    month_number(groups[0])? as i64,
                    num(groups[1])?,
                )
            } else {
                ymd(coerce_year(num(groups[0])?), num(groups[1])?, num(groups[2])?)
            }
        }
        2 => year_month(num(groups[0])?, num(groups[1])?),
        _ => None,
    }
}

/// Built-in dialects in precedence order, most specific first.
static BUILTIN_PATTERNS: Lazy<Vec<DatePattern>> = Lazy::new(|| {
    vec![
        DatePattern::new(
            "era-kanji",
            r"(令和|平成|昭和)\s*(元|\d{1,2})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日",
            Some(GroupOrder::EraYmd),
            None,
            Some(JAPANESE_ERAS),
        ),
        DatePattern::new(
            "kanji-ymd",
            r"(\d{2,4})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日?",
            Some(GroupOrder::Ymd),
            None,
            None,
        ),
        DatePattern::new(
            "kanji-month-western-year",
            r"(\d{1,2})\s*月\s*(\d{1,2})\s*,\s*(\d{2,4})",
            Some(GroupOrder::Mdy),
            None,
            None,
        ),
        DatePattern::new(
            "numeric-ymd",
            r"(\d{2,4})[./-](\d{1,2})[./-](\d{1,2})",
            Some(GroupOrder::Ymd),
            None,
            None,
        ),
        DatePattern::new(
            "english-mdy",
            r"(?i)\b([A-Za-z]{3,9})\.?\s+(\d{1,2})(?:,\s*|\s+)(\d{2,4})\b",
            Some(GroupOrder::Mdy),
            Some(MonthNames::English),
            None,
        ),
        DatePattern::new(
            "english-dmy",
            r"(?i)\b(\d{1,2})\.?\s+([A-Za-z]{3,9})\s+(\d{2,4})\b",
            Some(GroupOrder::Dmy),
            Some(MonthNames::English),
            None,
        ),
        DatePattern::new(
            "kanji-ym",
            r"(\d{4})\s*年\s*(\d{1,2})\s*月",
            Some(GroupOrder::YearMonth),
            None,
            None,
        ),
        DatePattern::new(
            "numeric-ym",
            r"(\d{4})[./-](\d{1,2})",
            Some(GroupOrder::YearMonth),
            None,
            None,
        ),
        DatePattern::new(
            "kanji-month-year",
            r"(\d{1,2})\s*月\s+(\d{4})",
            Some(GroupOrder::YearMonth),
            None,
            None,
        ),
    ]
});

pub(crate) fn builtins() -> &'static [DatePattern] {
    &BUILTIN_PATTERNS
}

/// Per-site primary date pattern, as declared in the site YAML.
///
/// Patterns that omit `order` get the loose interpretation, which accepts
/// the mixed alternation regexes older site definitions carry.
#[derive(Debug, Clone, Deserialize)]
pub struct PatternSpec {
    pub regex: String,
    #[serde(default)]
    pub order: Option<GroupOrder>,
    #[serde(default)]
    pub month_names: bool,
}

impl PatternSpec {
    pub fn compile(&self) -> Result<DatePattern, ScrapeError> {
        let regex = Regex::new(&self.regex)
            .map_err(|e| ScrapeError::Config(format!("bad date regex `{}`: {e}", self.regex)))?;
        let eras = match self.order {
            Some(GroupOrder::EraYmd) => Some(JAPANESE_ERAS),
            _ => None,
        };
        Ok(DatePattern {
            name: "primary".to_string(),
            regex,
            order: self.order,
            months: self.month_names.then_some(MonthNames::English),
            eras,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_number_long_and_short() {
        assert_eq!(month_number("August"), Some(8));
        assert_eq!(month_number("aug"), Some(8));
        assert_eq!(month_number("Sept"), Some(9));
        assert_eq!(month_number("Sep."), Some(9));
        assert_eq!(month_number("June"), Some(6));
        assert_eq!(month_number("jun"), Some(6));
        assert_eq!(month_number("notamonth"), None);
        assert_eq!(month_number("ju"), None);
    }

    #[test]
    fn test_year_month_requires_exactly_one_four_digit_group() {
        assert_eq!(year_month(2024, 10), NaiveDate::from_ymd_opt(2024, 10, 1));
        assert_eq!(year_month(8, 2025), NaiveDate::from_ymd_opt(2025, 8, 1));
        assert_eq!(year_month(8, 10), None);
        assert_eq!(year_month(2024, 2025), None);
    }

    #[test]
    fn test_builtin_precedence_era_before_plain_kanji() {
        let folded = "令和7年8月7日";
        let hit = builtins()
            .iter()
            .find_map(|p| p.try_extract(folded).map(|d| (p.name().to_string(), d)))
            .unwrap();
        assert_eq!(hit.0, "era-kanji");
        assert_eq!(hit.1, NaiveDate::from_ymd_opt(2025, 8, 7).unwrap());
    }

    #[test]
    fn test_invalid_calendar_date_falls_through() {
        // Month 13 matches the numeric regex but is not a real date; the
        // pattern must report no-match instead of failing the lookup.
        let pattern = &builtins()[3];
        assert_eq!(pattern.name(), "numeric-ymd");
        assert_eq!(pattern.try_extract("2025/13/40"), None);
    }

    #[test]
    fn test_loose_interpretation_month_name_wins_month_slot() {
        let spec = PatternSpec {
            regex: r"([A-Za-z]{3})\s+(\d{1,2}),\s+(\d{4})".to_string(),
            order: None,
            month_names: false,
        };
        let pattern = spec.compile().unwrap();
        assert_eq!(
            pattern.try_extract("Aug 6, 2025"),
            NaiveDate::from_ymd_opt(2025, 8, 6)
        );
    }

    #[test]
    fn test_loose_interpretation_alternation_effective_groups() {
        // Older definitions or a single regex with two alternatives: either
        // the English groups or the kanji month+year groups are captured.
        let spec = PatternSpec {
            regex: r"(?:([A-Za-z]{3})\s+(\d{1,2}),\s+(\d{4}))|(?:(\d{1,2})月\s+(\d{4}))"
                .to_string(),
            order: None,
            month_names: false,
        };
        let pattern = spec.compile().unwrap();
        assert_eq!(
            pattern.try_extract("Aug 6, 2025"),
            NaiveDate::from_ymd_opt(2025, 8, 6)
        );
        assert_eq!(
            pattern.try_extract("8月 2025"),
            NaiveDate::from_ymd_opt(2025, 8, 1)
        );
    }

    #[test]
    fn test_pattern_spec_bad_regex_is_config_error() {
        let spec = PatternSpec {
            regex: "([A-Za-z".to_string(),
            order: None,
            month_names: false,
        };
        assert!(matches!(spec.compile(), Err(ScrapeError::Config(_))));
    }
}
