use crate::models::{effective_status, AmountValue, Invoice, InvoiceId};
use crate::service::format::{coerce_number, parse_instant};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// 可排序的列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortColumn {
    Id,
    Vendor,
    InvoiceDate,
    Amount,
    Currency,
    Category,
    Status,
    SubmittedBy,
    ReviewedBy,
    ApprovedBy,
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let column = match s {
            "id" => SortColumn::Id,
            "vendor" => SortColumn::Vendor,
            "invoiceDate" => SortColumn::InvoiceDate,
            "amount" => SortColumn::Amount,
            "currency" => SortColumn::Currency,
            "category" => SortColumn::Category,
            "status" => SortColumn::Status,
            "submittedBy" => SortColumn::SubmittedBy,
            "reviewedBy" => SortColumn::ReviewedBy,
            "approvedBy" => SortColumn::ApprovedBy,
            other => return Err(format!("unknown sort column: {}", other)),
        };
        Ok(column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

pub type Comparator = fn(&Invoice, &Invoice) -> Ordering;

/// 列 -> 比较器，只在这里注册
const COMPARATORS: [(SortColumn, Comparator); 10] = [
    (SortColumn::Id, compare_id),
    (SortColumn::Vendor, |a, b| generic(a.vendor.as_deref(), b.vendor.as_deref())),
    (SortColumn::InvoiceDate, compare_invoice_date),
    (SortColumn::Amount, compare_amount),
    (SortColumn::Currency, |a, b| generic(a.currency.as_deref(), b.currency.as_deref())),
    (SortColumn::Category, |a, b| generic(a.category.as_deref(), b.category.as_deref())),
    (SortColumn::Status, compare_status),
    (SortColumn::SubmittedBy, |a, b| {
        generic(a.submitted_by.as_deref(), b.submitted_by.as_deref())
    }),
    (SortColumn::ReviewedBy, |a, b| {
        generic(a.reviewed_by.as_deref(), b.reviewed_by.as_deref())
    }),
    (SortColumn::ApprovedBy, |a, b| {
        generic(a.approved_by.as_deref(), b.approved_by.as_deref())
    }),
];

pub fn comparator(column: SortColumn) -> Comparator {
    COMPARATORS
        .iter()
        .find(|(c, _)| *c == column)
        .map(|(_, cmp)| *cmp)
        .unwrap_or(|_, _| Ordering::Equal)
}

/// 缺失值与任何值都不可比，视为相等
fn generic(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

/// 不可比（NaN）视为相等
fn partial(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn compare_id(a: &Invoice, b: &Invoice) -> Ordering {
    match (&a.id, &b.id) {
        (InvoiceId::Number(x), InvoiceId::Number(y)) => x.cmp(y),
        (InvoiceId::Text(x), InvoiceId::Text(y)) => x.cmp(y),
        (InvoiceId::Number(x), InvoiceId::Text(y)) => {
            partial(*x as f64, coerce_number(y).unwrap_or(f64::NAN))
        }
        (InvoiceId::Text(x), InvoiceId::Number(y)) => {
            partial(coerce_number(x).unwrap_or(f64::NAN), *y as f64)
        }
    }
}

fn timestamp(invoice: &Invoice) -> f64 {
    invoice
        .invoice_date
        .as_deref()
        .and_then(parse_instant)
        .map(|dt| dt.timestamp_millis() as f64)
        .unwrap_or(f64::NAN)
}

fn compare_invoice_date(a: &Invoice, b: &Invoice) -> Ordering {
    partial(timestamp(a), timestamp(b))
}

/// 排序用金额：数字前缀解析，无效值为 0
pub fn sort_amount(amount: Option<&AmountValue>) -> f64 {
    let parsed = match amount {
        Some(AmountValue::Number(n)) => *n,
        Some(AmountValue::Text(s)) => parse_float_prefix(s),
        None => f64::NAN,
    };
    if parsed.is_nan() {
        0.0
    } else {
        parsed
    }
}

fn compare_amount(a: &Invoice, b: &Invoice) -> Ordering {
    partial(sort_amount(a.amount.as_ref()), sort_amount(b.amount.as_ref()))
}

fn compare_status(a: &Invoice, b: &Invoice) -> Ordering {
    effective_status(a).key().cmp(effective_status(b).key())
}

/// 解析字符串开头最长的十进制数字 ("12.5kg" -> 12.5)，失败为 NaN
fn parse_float_prefix(raw: &str) -> f64 {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    if s[end..].starts_with("Infinity") {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let int_end = digits_from(end);
    let mut mantissa_end = int_end;
    if mantissa_end < bytes.len() && bytes[mantissa_end] == b'.' {
        mantissa_end = digits_from(mantissa_end + 1);
    }
    let has_digits = int_end > end || mantissa_end > int_end + 1;
    if !has_digits {
        return f64::NAN;
    }
    end = mantissa_end;

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && matches!(bytes[exp], b'+' | b'-') {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// 稳定归并排序
///
/// 比较器不一定满足全序（NaN 日期、缺失值），std 的 `sort_by`
/// 在这种情况下允许 panic，这里不会。
pub fn stable_sort_by<T, F>(items: &mut Vec<T>, mut compare: F)
where
    T: Clone,
    F: FnMut(&T, &T) -> Ordering,
{
    let len = items.len();
    if len < 2 {
        return;
    }

    let mut buffer = items.clone();
    let mut width = 1;
    while width < len {
        let mut start = 0;
        while start < len {
            let mid = (start + width).min(len);
            let end = (start + 2 * width).min(len);
            let (mut left, mut right, mut out) = (start, mid, start);

            while left < mid && right < end {
                // 右侧严格小于左侧时才取右侧，保证稳定
                if compare(&items[right], &items[left]) == Ordering::Less {
                    buffer[out] = items[right].clone();
                    right += 1;
                } else {
                    buffer[out] = items[left].clone();
                    left += 1;
                }
                out += 1;
            }
            while left < mid {
                buffer[out] = items[left].clone();
                left += 1;
                out += 1;
            }
            while right < end {
                buffer[out] = items[right].clone();
                right += 1;
                out += 1;
            }
            start = end;
        }
        std::mem::swap(items, &mut buffer);
        width *= 2;
    }
}

/// 按列和方向排序，返回借用的新序列，不修改输入
pub fn sort_invoices<'a>(
    invoices: &[&'a Invoice],
    column: Option<SortColumn>,
    direction: Option<SortDirection>,
) -> Vec<&'a Invoice> {
    let mut sorted = invoices.to_vec();
    let (Some(column), Some(direction)) = (column, direction) else {
        return sorted;
    };

    let cmp = comparator(column);
    stable_sort_by(&mut sorted, |a, b| match direction {
        SortDirection::Asc => cmp(a, b),
        SortDirection::Desc => cmp(a, b).reverse(),
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn with_amount(id: i64, amount: AmountValue) -> Invoice {
        Invoice {
            amount: Some(amount),
            ..Invoice::new(id)
        }
    }

    fn ids(invoices: &[&Invoice]) -> Vec<String> {
        invoices.iter().map(|i| i.id.to_string()).collect()
    }

    #[test]
    fn every_column_has_a_comparator() {
        for (column, _) in COMPARATORS {
            let a = Invoice::new(1);
            let _ = comparator(column)(&a, &a);
        }
        assert_eq!(COMPARATORS.len(), 10);
    }

    #[test]
    fn parses_column_keys() {
        assert_eq!("invoiceDate".parse::<SortColumn>(), Ok(SortColumn::InvoiceDate));
        assert!("nope".parse::<SortColumn>().is_err());
    }

    #[test]
    fn parse_float_prefix_semantics() {
        assert_eq!(parse_float_prefix("10"), 10.0);
        assert_eq!(parse_float_prefix("  12.5kg"), 12.5);
        assert_eq!(parse_float_prefix(".5"), 0.5);
        assert_eq!(parse_float_prefix("-3e2x"), -300.0);
        assert_eq!(parse_float_prefix("1e"), 1.0);
        assert!(parse_float_prefix("abc").is_nan());
        assert!(parse_float_prefix(".").is_nan());
        assert!(parse_float_prefix("").is_nan());
    }

    #[test]
    fn amount_sort_treats_invalid_as_zero() {
        let invoices = vec![
            with_amount(1, AmountValue::Text("10".into())),
            with_amount(2, AmountValue::Number(5.0)),
            with_amount(3, AmountValue::Text("abc".into())),
        ];
        let refs: Vec<&Invoice> = invoices.iter().collect();

        let asc = sort_invoices(&refs, Some(SortColumn::Amount), Some(SortDirection::Asc));
        assert_eq!(ids(&asc), vec!["3", "2", "1"]);

        let desc = sort_invoices(&refs, Some(SortColumn::Amount), Some(SortDirection::Desc));
        assert_eq!(ids(&desc), vec!["1", "2", "3"]);

        // 输入不被修改
        assert_eq!(ids(&refs), vec!["1", "2", "3"]);
    }

    #[test]
    fn ties_keep_input_order_in_both_directions() {
        let invoices: Vec<Invoice> = (1..=5)
            .map(|id| with_amount(id, AmountValue::Number(if id % 2 == 0 { 1.0 } else { 2.0 })))
            .collect();
        let refs: Vec<&Invoice> = invoices.iter().collect();

        let asc = sort_invoices(&refs, Some(SortColumn::Amount), Some(SortDirection::Asc));
        assert_eq!(ids(&asc), vec!["2", "4", "1", "3", "5"]);

        let desc = sort_invoices(&refs, Some(SortColumn::Amount), Some(SortDirection::Desc));
        assert_eq!(ids(&desc), vec!["1", "3", "5", "2", "4"]);
    }

    #[test]
    fn status_sort_uses_derived_value_when_absent() {
        let mut approved = Invoice::new(1);
        approved.approved = Some(true);
        let mut review = Invoice::new(2);
        review.status = Some("for_review".into());
        let pending = Invoice::new(3);

        let invoices = [approved, review, pending];
        let refs: Vec<&Invoice> = invoices.iter().collect();
        let asc = sort_invoices(&refs, Some(SortColumn::Status), Some(SortDirection::Asc));
        assert_eq!(ids(&asc), vec!["1", "3", "2"]);
    }

    #[test]
    fn date_sort_orders_parsed_timestamps() {
        let dated = |id: i64, date: &str| Invoice {
            invoice_date: Some(date.to_string()),
            ..Invoice::new(id)
        };
        let invoices = [
            dated(1, "2024-05-01"),
            dated(2, "2023-12-31"),
            dated(3, "2024-01-15T08:00:00"),
        ];
        let refs: Vec<&Invoice> = invoices.iter().collect();
        let asc = sort_invoices(&refs, Some(SortColumn::InvoiceDate), Some(SortDirection::Asc));
        assert_eq!(ids(&asc), vec!["2", "3", "1"]);
    }

    #[test]
    fn invalid_dates_do_not_panic() {
        let invoices: Vec<Invoice> = (0..40i64)
            .map(|i| Invoice {
                invoice_date: Some(if i % 3 == 0 {
                    "garbage".to_string()
                } else {
                    format!("2024-01-{:02}", 28 - (i % 28))
                }),
                ..Invoice::new(i)
            })
            .collect();
        let refs: Vec<&Invoice> = invoices.iter().collect();
        let sorted = sort_invoices(&refs, Some(SortColumn::InvoiceDate), Some(SortDirection::Desc));
        assert_eq!(sorted.len(), 40);
    }

    #[test]
    fn vendor_sort_is_lexicographic() {
        let named = |id: i64, vendor: &str| Invoice {
            vendor: Some(vendor.to_string()),
            ..Invoice::new(id)
        };
        let invoices = [named(1, "beta"), named(2, "Alpha"), named(3, "alpha")];
        let refs: Vec<&Invoice> = invoices.iter().collect();
        let asc = sort_invoices(&refs, Some(SortColumn::Vendor), Some(SortDirection::Asc));
        assert_eq!(ids(&asc), vec!["2", "3", "1"]);
    }

    #[test]
    fn no_direction_keeps_input_order() {
        let invoices = [Invoice::new(2), Invoice::new(1)];
        let refs: Vec<&Invoice> = invoices.iter().collect();
        let sorted = sort_invoices(&refs, Some(SortColumn::Id), None);
        assert_eq!(ids(&sorted), vec!["2", "1"]);
    }
}
