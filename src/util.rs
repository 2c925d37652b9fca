// Utility helpers for parsing and display formatting.
//
// Field parsing is forgiving: the CSV exports come from spreadsheets, so
// numbers may carry thousands separators and text columns stray whitespace.
// Anything that cannot be parsed safely becomes `None` and the caller decides
// the default.
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64`.
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an integer column. Spreadsheet exports sometimes write ids as
/// `3.0`, so whole floats are accepted too.
pub fn parse_i64_safe(s: Option<&str>) -> Option<i64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f = parse_f64_safe(Some(s))?;
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Trimmed text, `None` when missing or blank.
pub fn parse_text(s: Option<&str>) -> Option<String> {
    let s = s?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Share of `part` in `whole` as a percentage rounded to one decimal.
///
/// Returns `None` when `whole` is zero instead of producing NaN.
pub fn percent(part: usize, whole: usize) -> Option<f64> {
    if whole == 0 {
        return None;
    }
    Some(round_to(part as f64 / whole as f64 * 100.0, 1))
}

pub fn average(sum: f64, count: usize) -> f64 {
    // Returns 0 for an empty group to avoid NaNs.
    if count == 0 {
        return 0.0;
    }
    sum / count as f64
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimal places plus thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Honduran usage groups thousands with commas, same as `Locale::en`.
    n.to_formatted_string(&Locale::en)
}

/// Lempira amounts in millions, e.g. `L 1.00M`.
pub fn format_lempiras(value: f64) -> String {
    format!("L {:.2}M", value / 1_000_000.0)
}

/// Dollar amounts in millions, e.g. `$ 2.50M`.
pub fn format_usd(value: f64) -> String {
    format!("$ {:.2}M", value / 1_000_000.0)
}

/// Lempira amounts in thousands with no decimals, e.g. `L 125K`.
pub fn format_lempiras_thousands(value: f64) -> String {
    format!("L {:.0}K", value / 1_000.0)
}

pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}%", v),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_f64_strips_separators() {
        assert_eq!(parse_f64_safe(Some(" 1,250,000.50 ")), Some(1_250_000.5));
        assert_eq!(parse_f64_safe(Some("42")), Some(42.0));
    }

    #[test]
    fn parse_f64_rejects_text_and_blanks() {
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(Some("   ")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn parse_i64_accepts_whole_floats() {
        assert_eq!(parse_i64_safe(Some("7")), Some(7));
        assert_eq!(parse_i64_safe(Some("7.0")), Some(7));
        assert_eq!(parse_i64_safe(Some("7.5")), None);
        assert_eq!(parse_i64_safe(Some("")), None);
    }

    #[test]
    fn parse_text_trims() {
        assert_eq!(parse_text(Some("  ACTIVO ")), Some("ACTIVO".to_string()));
        assert_eq!(parse_text(Some("  ")), None);
    }

    #[test]
    fn percent_guards_zero_denominator() {
        assert_eq!(percent(0, 0), None);
        assert_eq!(percent(2, 3), Some(66.7));
        assert_eq!(percent(3, 3), Some(100.0));
    }

    #[test]
    fn average_of_empty_group_is_zero() {
        assert_eq!(average(0.0, 0), 0.0);
        assert_eq!(average(10.0, 4), 2.5);
    }

    #[test]
    fn currency_formats() {
        assert_eq!(format_lempiras(1_000_000.0), "L 1.00M");
        assert_eq!(format_lempiras(0.0), "L 0.00M");
        assert_eq!(format_usd(2_345_678.0), "$ 2.35M");
        assert_eq!(format_lempiras_thousands(125_400.0), "L 125K");
    }

    #[test]
    fn number_formats() {
        assert_eq!(format_int(1_234_567usize), "1,234,567");
        assert_eq!(format_number(1234.5, 2), "1,234.50");
        assert_eq!(format_number(-1234.5, 1), "-1,234.5");
        assert_eq!(format_number(12.0, 0), "12");
    }

    #[test]
    fn percent_display() {
        assert_eq!(format_percent(Some(66.7)), "66.7%");
        assert_eq!(format_percent(None), "N/A");
    }
}
