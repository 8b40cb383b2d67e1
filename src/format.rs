//! Display helpers for the values the analytics layer produces (es-MX conventions).

use num_format::{Locale, ToFormattedString};

/// Mexican peso amount with thousands separators: `$1,234,568` or `$1,234,567.9`.
pub fn format_currency(value: f64, decimals: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let formatted = format!("{:.*}", decimals, value.abs());

    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut out = String::new();
    // Rounding can turn -0.4 into "0"; don't print "-$0".
    if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push('$');
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Signed percentage with one decimal, `N/A` when there is no basis for it.
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let sign = if v >= 0.0 { "+" } else { "" };
            format!("{}{:.1}%", sign, v)
        }
        _ => "N/A".to_string(),
    }
}

pub fn format_count(value: u64) -> String {
    value.to_formatted_string(&Locale::es_MX)
}

/// Chart axis tick: `$450k`.
pub fn format_thousands_tick(value: f64) -> String {
    format!("${}k", (value / 1000.0).round() as i64)
}

fn group_thousands(digits: &str) -> String {
    match digits.parse::<u128>() {
        Ok(value) => value.to_formatted_string(&Locale::es_MX),
        Err(_) => digits.to_string(),
    }
}
