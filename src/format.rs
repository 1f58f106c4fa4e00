//! Locale display formatting for amounts and dates. Missing or unparseable
//! input degrades to the `T/A` marker or echoes the raw value, never fails.

use regex::Regex;
use std::sync::OnceLock;

/// Shown for missing values (tidak ada).
pub const NOT_AVAILABLE: &str = "T/A";

const MONTHS_SHORT_ID: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des",
];

fn amount_symbols() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9.\-]+").expect("amount symbols regex"))
}

/// Rupiah display string, e.g. `Rp 15.000,00`. Zero displays as the
/// not-available marker, matching how absent totals are presented.
pub fn format_currency(amount: f64) -> String {
    if amount == 0.0 || !amount.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}Rp {}", sign, group_idr(amount.abs()))
}

pub fn format_currency_opt(amount: Option<f64>) -> String {
    match amount {
        Some(n) => format_currency(n),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Tolerant variant for raw service strings that may carry currency symbols
/// or grouping. Echoes the input when nothing numeric is left after
/// stripping.
pub fn format_currency_text(value: &str) -> String {
    if value.trim().is_empty() || value == "N/A" {
        return NOT_AVAILABLE.to_string();
    }
    match parse_amount(value) {
        Some(n) => format_currency(n),
        None => value.to_string(),
    }
}

/// Strip currency symbols and grouping, then parse the remainder.
pub fn parse_amount(value: &str) -> Option<f64> {
    let cleaned = amount_symbols().replace_all(value, "");
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Group an absolute amount as `1.234.567,89` (id-ID digit grouping).
fn group_idr(amount: f64) -> String {
    let fixed = format!("{:.2}", amount);
    let (int_part, dec_part) = match fixed.split_once('.') {
        Some((i, d)) => (i, d),
        None => (fixed.as_str(), "00"),
    };
    let digits: Vec<char> = int_part.chars().collect();
    let len = digits.len();
    let mut out = String::new();
    for (i, c) in digits.into_iter().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out.push(',');
    out.push_str(dec_part);
    out
}

/// `2024-03-07` or an RFC 3339 timestamp to `7 Mar 2024`. Missing input
/// yields the not-available marker; unparseable input is echoed back.
pub fn format_date(date_str: &str) -> String {
    let trimmed = date_str.trim();
    if trimmed.is_empty() || trimmed == "N/A" {
        return NOT_AVAILABLE.to_string();
    }

    let date = chrono::DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.date_naive())
        .or_else(|_| chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"));
    match date {
        Ok(d) => {
            use chrono::Datelike;
            format!(
                "{} {} {}",
                d.day(),
                MONTHS_SHORT_ID[d.month0() as usize],
                d.year()
            )
        }
        Err(_) => trimmed.to_string(),
    }
}

/// Epoch milliseconds to a local `dd/mm/yyyy HH:MM:SS` string for export
/// rows and the history list.
pub fn format_timestamp_ms(ms: i64) -> String {
    use chrono::TimeZone;
    match chrono::Local.timestamp_millis_opt(ms).single() {
        Some(dt) => dt.format("%d/%m/%Y %H:%M:%S").to_string(),
        None => ms.to_string(),
    }
}

/// Human-readable byte size, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let exponent = ((bytes as f64).ln() / 1024_f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let scaled = bytes as f64 / 1024_f64.powi(exponent as i32);
    let mut number = format!("{:.2}", scaled);
    while number.ends_with('0') {
        number.pop();
    }
    if number.ends_with('.') {
        number.pop();
    }
    format!("{} {}", number, UNITS[exponent])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(15_000.0), "Rp 15.000,00");
        assert_eq!(format_currency(1_234_567.89), "Rp 1.234.567,89");
        assert_eq!(format_currency(-2_000.0), "-Rp 2.000,00");
        assert_eq!(format_currency(500.0), "Rp 500,00");
    }

    #[test]
    fn missing_amounts_display_as_not_available() {
        assert_eq!(format_currency(0.0), NOT_AVAILABLE);
        assert_eq!(format_currency_opt(None), NOT_AVAILABLE);
        assert_eq!(format_currency_opt(Some(750.0)), "Rp 750,00");
    }

    #[test]
    fn currency_text_strips_symbols_or_echoes() {
        assert_eq!(format_currency_text("Rp15000"), "Rp 15.000,00");
        assert_eq!(format_currency_text("$ 1,000"), "Rp 1.000,00");
        assert_eq!(format_currency_text("harga"), "harga");
        assert_eq!(format_currency_text(""), NOT_AVAILABLE);
        assert_eq!(format_currency_text("N/A"), NOT_AVAILABLE);
    }

    #[test]
    fn parse_amount_handles_symbols_and_garbage() {
        assert_eq!(parse_amount("Rp 12500"), Some(12_500.0));
        assert_eq!(parse_amount("15000.50"), Some(15_000.5));
        assert_eq!(parse_amount("-250"), Some(-250.0));
        assert_eq!(parse_amount("tanpa angka"), None);
    }

    #[test]
    fn dates_format_with_indonesian_months() {
        assert_eq!(format_date("2024-03-07"), "7 Mar 2024");
        assert_eq!(format_date("2023-08-15T10:30:00+07:00"), "15 Agu 2023");
        assert_eq!(format_date(""), NOT_AVAILABLE);
        assert_eq!(format_date("N/A"), NOT_AVAILABLE);
        assert_eq!(format_date("bukan tanggal"), "bukan tanggal");
    }

    #[test]
    fn file_sizes_scale_by_unit() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1_536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
    }
}
