//! Normalisation of passage, culture-time and dosage cells.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{EtlError, Result, RowLocation};

static RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+-\d+").expect("range pattern compiles"));

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("number pattern compiles"));

static CONCENTRATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^[~<>]?\s*
        \d+(?:\.\d+)?(?:\s*-\s*\d+(?:\.\d+)?)?   # value or range
        \s*
        (?P<unit>nM|pM|mM|[uµμ]M|ng/mL|mg/mL|[uµμ]g/mL|x)$
        ",
    )
    .expect("concentration pattern compiles")
});

/// Comparator implied by a cell: `~` for approximate values and ranges,
/// `>`/`<` for bounds, `=` otherwise. `None` for `unknown`.
pub fn value_cmp(value: &str) -> Option<&'static str> {
    if value.starts_with('~') || RANGE.is_match(value) {
        Some("~")
    } else if value.starts_with('>') {
        Some(">")
    } else if value.starts_with('<') {
        Some("<")
    } else if !is_unknown(value) {
        Some("=")
    } else {
        None
    }
}

/// Mean of all numbers in the cell, formatted like `%g`. A range `2-4` gives `3`.
pub fn positive_num(value: &str) -> Option<String> {
    let numbers: Vec<f64> = NUMBER
        .find_iter(value)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect();
    if numbers.is_empty() {
        return None;
    }
    let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
    Some(format_g(mean))
}

/// Unit of a culture-time cell, from its suffix.
pub fn time_unit(value: &str) -> Option<&'static str> {
    let ends = |suffixes: &[&str]| suffixes.iter().any(|s| value.ends_with(s));
    if ends(&["ord", "seq"]) {
        Some("ordinal")
    } else if ends(&["d", "day"]) {
        Some("day")
    } else if ends(&["w", "week"]) {
        Some("week")
    } else if ends(&["m", "mo", "month"]) {
        Some("month")
    } else {
        None
    }
}

pub fn is_unknown(value: &str) -> bool {
    value.eq_ignore_ascii_case("unknown")
}

/// A parsed drug concentration cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Concentration {
    pub cmp: &'static str,
    pub value: String,
    pub unit: String,
}

/// Parses a concentration such as `10nM`, `>1 µM`, `2-4 ng/mL` or `5x`.
///
/// `unknown` yields `None`; anything outside the unit grammar is an error.
pub fn parse_concentration(value: &str, at: &RowLocation) -> Result<Option<Concentration>> {
    if is_unknown(value) {
        return Ok(None);
    }
    let invalid = || EtlError::InvalidMeasure {
        field: "Concentration".to_string(),
        value: value.to_string(),
        at: at.clone(),
    };
    let caps = CONCENTRATION.captures(value).ok_or_else(invalid)?;
    let unit = caps.name("unit").ok_or_else(invalid)?.as_str();
    let number = positive_num(value).ok_or_else(invalid)?;
    let cmp = value_cmp(value).ok_or_else(invalid)?;
    Ok(Some(Concentration {
        cmp,
        value: number,
        unit: normalize_unit(unit),
    }))
}

fn normalize_unit(unit: &str) -> String {
    unit.replace(['u', 'μ'], "µ")
}

/// Formats a float the way C's `%g` does with the default precision of 6.
pub fn format_g(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let sci = format!("{:.5e}", value);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => return sci,
    };
    if !(-4..6).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa), sign, exp.abs())
    } else {
        let decimals = (5 - exp).max(0) as usize;
        trim_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
