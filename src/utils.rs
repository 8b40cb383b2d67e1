use chrono::{Datelike, Month, NaiveDate};
use std::collections::BTreeSet;
use std::fmt;

const MONTH_NAMES: [(&str, u32); 13] = [
    ("enero", 1),
    ("febrero", 2),
    ("marzo", 3),
    ("abril", 4),
    ("mayo", 5),
    ("junio", 6),
    ("julio", 7),
    ("agosto", 8),
    ("septiembre", 9),
    ("setiembre", 9),
    ("octubre", 10),
    ("noviembre", 11),
    ("diciembre", 12),
];

const MONTH_LABELS: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

const MONTH_ABBR: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

/// Trims and collapses internal runs of whitespace to a single space.
pub fn normalize_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case- and accent-insensitive form used for header matching and fingerprints.
pub fn fold_text(value: &str) -> String {
    normalize_text(value)
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            other => other,
        })
        .collect()
}

/// Sortable month derived from a free-text label such as "Octubre 2025".
///
/// Labels that cannot be resolved to a Spanish month name plus a four digit
/// year become [`MonthKey::Unknown`], which orders after every known month and
/// renders as `9999-99`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MonthKey {
    Known { year: i32, month: u32 },
    Unknown,
}

impl MonthKey {
    pub const UNKNOWN_SENTINEL: &'static str = "9999-99";

    /// Accepts "Enero 2026", "enero-2026", "ENERO_2026" and "Setiembre 2025".
    pub fn parse(label: &str) -> Self {
        let lowered = normalize_text(label).to_lowercase().replace(['-', '_'], " ");
        let tokens: Vec<&str> = lowered.split_whitespace().collect();

        let month = tokens.first().and_then(|name| month_number(name));
        let year = tokens
            .iter()
            .find(|t| t.len() == 4 && t.chars().all(|c| c.is_ascii_digit()))
            .and_then(|t| t.parse::<i32>().ok())
            .filter(|y| *y > 0);

        match (year, month) {
            (Some(year), Some(month)) if NaiveDate::from_ymd_opt(year, month, 1).is_some() => {
                MonthKey::Known { year, month }
            }
            _ => MonthKey::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, MonthKey::Known { .. })
    }

    /// First calendar day of the month, if known.
    pub fn first_day(&self) -> Option<NaiveDate> {
        match self {
            MonthKey::Known { year, month } => NaiveDate::from_ymd_opt(*year, *month, 1),
            MonthKey::Unknown => None,
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        MonthKey::Known {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Canonical Spanish label, e.g. "Septiembre 2025".
    pub fn label(&self) -> Option<String> {
        match self {
            MonthKey::Known { year, month } => {
                Some(format!("{} {}", MONTH_LABELS[(*month - 1) as usize], year))
            }
            MonthKey::Unknown => None,
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthKey::Known { year, month } => write!(f, "{:04}-{:02}", year, month),
            MonthKey::Unknown => f.write_str(Self::UNKNOWN_SENTINEL),
        }
    }
}

fn month_number(name: &str) -> Option<u32> {
    let number = MONTH_NAMES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, n)| *n)?;

    // Round-trip through chrono so the table can never hand out an invalid month.
    Month::try_from(number as u8)
        .ok()
        .map(|m| m.number_from_month())
}

/// Rewrites a month label to its canonical form ("octubre-2025" -> "Octubre 2025").
/// Unrecognized labels are only whitespace-normalized.
pub fn canonical_month_label(label: &str) -> String {
    MonthKey::parse(label)
        .label()
        .unwrap_or_else(|| normalize_text(label))
}

/// Short axis label: "Oct" for "Octubre 2025".
pub fn month_abbreviation(label: &str) -> String {
    match MonthKey::parse(label) {
        MonthKey::Known { month, .. } => MONTH_ABBR[(month - 1) as usize].to_string(),
        MonthKey::Unknown => normalize_text(label)
            .split(' ')
            .next()
            .unwrap_or_default()
            .chars()
            .take(3)
            .collect(),
    }
}

/// Selector label: "Oct 25" for "Octubre 2025", the label itself otherwise.
pub fn month_button_label(label: &str) -> String {
    match MonthKey::parse(label) {
        MonthKey::Known { year, month } => format!(
            "{} {:02}",
            MONTH_ABBR[(month - 1) as usize],
            year.rem_euclid(100)
        ),
        MonthKey::Unknown => label.to_string(),
    }
}

/// Distinct, non-empty month labels sorted chronologically.
/// Ties on [`MonthKey`] (only possible among unknown labels) fall back to the label text.
pub fn sort_month_labels<'a, I>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let unique: BTreeSet<(MonthKey, &str)> = labels
        .into_iter()
        .filter(|l| !l.is_empty())
        .map(|l| (MonthKey::parse(l), l))
        .collect();

    unique.into_iter().map(|(_, l)| l.to_string()).collect()
}
