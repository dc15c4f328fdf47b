//! Display helpers matching the dashboard's en-ZA conventions: rand amounts
//! with space-grouped thousands and comma decimals, short date labels, and
//! signed percentage deltas.

use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `14 Jun 2025`
    Short,
    /// `14 June 2025`
    Long,
    /// `14 Jun 09:30`
    Time,
    /// `Jun 2025`
    Month,
    /// `Jun`
    MonthOnly,
}

/// `R 12 345,67`. With `show_symbol` off, just `12 345,67`.
pub fn format_currency(amount: f64, show_symbol: bool) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let formatted = format!("{},{:02}", group_thousands(cents / 100), cents % 100);

    match (amount < 0.0, show_symbol) {
        (true, true) => format!("-R {formatted}"),
        (true, false) => format!("-{formatted}"),
        (false, true) => format!("R {formatted}"),
        (false, false) => formatted,
    }
}

pub fn format_date(date: DateTime<Utc>, style: DateStyle) -> String {
    let pattern = match style {
        DateStyle::Short => "%-d %b %Y",
        DateStyle::Long => "%-d %B %Y",
        DateStyle::Time => "%-d %b %H:%M",
        DateStyle::Month => "%b %Y",
        DateStyle::MonthOnly => "%b",
    };
    date.format(pattern).to_string()
}

/// One decimal place, always unsigned unless `show_sign` forces a leading
/// `+`/`-`.
pub fn format_percentage(value: f64, show_sign: bool) -> String {
    let formatted = format!("{:.1}", value.abs());
    if show_sign {
        if value >= 0.0 {
            format!("+{formatted}%")
        } else {
            format!("-{formatted}%")
        }
    } else {
        format!("{formatted}%")
    }
}

/// `1.2K` / `3.4M` for large counts, the plain number otherwise.
pub fn format_compact_number(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        value.to_string()
    }
}

/// Human label for the dashboard periods; unknown values pass through.
pub fn period_label(period: &str) -> String {
    match period {
        "7d" => "Last 7 days".to_string(),
        "30d" => "Last 30 days".to_string(),
        "90d" => "Last 90 days".to_string(),
        "1y" => "Last year".to_string(),
        other => other.to_string(),
    }
}

/// Parse a `YYYY-MM` trend month into the first day of that month.
pub fn parse_month(month: &str) -> Option<NaiveDate> {
    let (year, month) = month.split_once('-')?;
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    grouped
}
