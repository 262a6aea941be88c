//! 展示格式化
//!
//! 所有函数都不会失败：无法解析的输入回落为占位符或原样返回。

use crate::models::AmountValue;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

pub const NOT_AVAILABLE: &str = "Not available";
pub const NO_AMOUNT: &str = "-";

const DATE_FORMAT: &str = "%d.%m.%Y";
const DATE_TIME_FORMAT: &str = "%d.%m.%Y %H:%M";

const NAIVE_DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// 格式化金额 (en-US 货币格式)
///
/// 金额为假值（缺失、0、NaN、空串）或非数字时返回 `"-"`；
/// 币种代码不合法时回落为 `"<币种或$><两位小数>"`。
pub fn format_currency(amount: Option<&AmountValue>, currency: Option<&str>) -> String {
    let value = match amount {
        None => return NO_AMOUNT.to_string(),
        Some(AmountValue::Number(n)) if *n == 0.0 || n.is_nan() => return NO_AMOUNT.to_string(),
        Some(AmountValue::Number(n)) => *n,
        Some(AmountValue::Text(s)) if s.is_empty() => return NO_AMOUNT.to_string(),
        Some(AmountValue::Text(s)) => match coerce_number(s) {
            Some(n) => n,
            None => return NO_AMOUNT.to_string(),
        },
    };

    let currency = currency.unwrap_or("USD");
    locale_currency(value, currency).unwrap_or_else(|| {
        let prefix = if currency.is_empty() { "$" } else { currency };
        format!("{}{:.2}", prefix, value)
    })
}

/// 字符串转数字：空白串为 0，非数字或非有限值为 None
pub(crate) fn coerce_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn locale_currency(value: f64, code: &str) -> Option<String> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let code = code.to_ascii_uppercase();
    let digits = fraction_digits(&code);
    let number = group_thousands(&format!("{:.*}", digits, value.abs()));
    let sign = if value.is_sign_negative() { "-" } else { "" };

    Some(match currency_symbol(&code) {
        Some(symbol) => format!("{}{}{}", sign, symbol, number),
        None => format!("{}{}\u{a0}{}", sign, code, number),
    })
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    let symbol = match code {
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        "CNY" => "CN¥",
        "INR" => "₹",
        "KRW" => "₩",
        "CAD" => "CA$",
        "AUD" => "A$",
        "NZD" => "NZ$",
        "HKD" => "HK$",
        "MXN" => "MX$",
        "BRL" => "R$",
        "TWD" => "NT$",
        "ILS" => "₪",
        "VND" => "₫",
        "PHP" => "₱",
        _ => return None,
    };
    Some(symbol)
}

fn fraction_digits(code: &str) -> usize {
    match code {
        "JPY" | "KRW" | "VND" | "CLP" | "ISK" | "UGX" | "PYG" => 0,
        "BHD" | "KWD" | "OMR" | "JOD" | "TND" | "LYD" => 3,
        _ => 2,
    }
}

fn group_thousands(number: &str) -> String {
    let (int_part, frac_part) = match number.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (number, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

/// 解析为本地墙钟时间
pub(crate) fn parse_local(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    for fmt in NAIVE_DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// 解析为绝对时间点，不带时区的输入按本地时间处理
pub(crate) fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = parse_local(raw)?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `dd.MM.yyyy`，解析失败原样返回
pub fn format_date(raw: &str) -> String {
    match parse_local(raw) {
        Some(dt) => dt.format(DATE_FORMAT).to_string(),
        None => raw.to_string(),
    }
}

/// `dd.MM.yyyy HH:mm`，空输入为 "Not available"，解析失败原样返回
pub fn format_date_time(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(s) if !s.is_empty() => s,
        _ => return NOT_AVAILABLE.to_string(),
    };
    match parse_local(raw) {
        Some(dt) => dt.format(DATE_TIME_FORMAT).to_string(),
        None => raw.to_string(),
    }
}

/// 相对时间 ("Yesterday", "3 hours ago")
pub fn format_time_elapsed(raw: Option<&str>) -> String {
    format_time_elapsed_at(raw, Utc::now())
}

/// 同 [`format_time_elapsed`]，但使用给定的当前时间
pub fn format_time_elapsed_at(raw: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(then) = raw.filter(|s| !s.is_empty()).and_then(parse_instant) else {
        return NOT_AVAILABLE.to_string();
    };

    let elapsed = now.signed_duration_since(then);
    let days = elapsed.num_days();
    let hours = elapsed.num_hours();
    let minutes = elapsed.num_minutes();

    if days >= 1 {
        if days == 1 {
            "Yesterday".to_string()
        } else {
            format!("{} days ago", days)
        }
    } else if hours >= 1 {
        plural(hours, "hour")
    } else if minutes >= 1 {
        plural(minutes, "minute")
    } else {
        "Just now".to_string()
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}
