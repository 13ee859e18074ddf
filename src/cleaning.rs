use crate::table::{OrderTable, Value, columns};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;

lazy_static! {
    static ref CURRENCY_MARKER: Regex = Regex::new(r"(?i)\b(rp|idr)").unwrap();
    static ref AMOUNT_CHARS: Regex = Regex::new(r"[^0-9.,]").unwrap();
    static ref SIGNED_AMOUNT_CHARS: Regex = Regex::new(r"[^0-9.,()\-]").unwrap();
}

const DATETIME_FORMATS: [&str; 12] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d %b %Y %H:%M",
    "%d %B %Y %H:%M",
];

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%d %b %Y",
    "%d %B %Y",
];

/// Parse a date or date-time cell. Unrecognised input yields `None`.
///
/// Slash and dash separated dates are read day-first (`05/03/2024` is 5 March).
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Parse a monetary or quantity cell such as `Rp 1.250.000`, `$1,250.50` or `(300)`.
///
/// Currency markers and whitespace are dropped before the sign is read, so
/// `Rp -5.000` and `-Rp 5.000` are both negative. Separator rules:
/// * `Rp`/`IDR` amounts use `.` for grouping and `,` for decimals
/// * with both `.` and `,` present, whichever comes last is the decimal mark
/// * a separator repeated more than once is grouping
/// * a single `,` followed by exactly three digits is grouping
/// * any other single separator is the decimal mark
pub fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let rupiah = CURRENCY_MARKER.is_match(trimmed);

    let signed = SIGNED_AMOUNT_CHARS.replace_all(trimmed, "");
    let negative = signed.starts_with('-')
        || signed.ends_with('-')
        || (signed.starts_with('(') && signed.ends_with(')'));

    let digits = AMOUNT_CHARS.replace_all(trimmed, "");
    if !digits.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalised = if rupiah {
        digits.replace('.', "").replace(',', ".")
    } else {
        normalise_separators(&digits)
    };

    let value: f64 = normalised.parse().ok()?;
    Some(if negative { -value } else { value })
}

fn normalise_separators(digits: &str) -> String {
    let last_dot = digits.rfind('.');
    let last_comma = digits.rfind(',');

    match (last_dot, last_comma) {
        (Some(dot), Some(comma)) => {
            let (grouping, decimal) = if dot > comma { (',', '.') } else { ('.', ',') };
            digits.replace(grouping, "").replace(decimal, ".")
        }
        (Some(_), None) => {
            if digits.matches('.').count() > 1 {
                digits.replace('.', "")
            } else {
                digits.to_string()
            }
        }
        (None, Some(comma)) => {
            let trailing = digits.len() - comma - 1;
            if digits.matches(',').count() > 1 || trailing == 3 {
                digits.replace(',', "")
            } else {
                digits.replace(',', ".")
            }
        }
        (None, None) => digits.to_string(),
    }
}

fn coerce_date(value: &Value) -> Value {
    match value {
        Value::Text(s) => parse_date(s).map(Value::Date).unwrap_or(Value::Null),
        Value::Date(d) => Value::Date(*d),
        _ => Value::Null,
    }
}

fn coerce_number(value: &Value) -> Value {
    match value {
        Value::Text(s) => parse_amount(s).map(Value::Number).unwrap_or(Value::Null),
        Value::Number(n) => Value::Number(*n),
        _ => Value::Null,
    }
}

/// Coerce the known date and numeric columns, then derive the month key.
///
/// Cells that fail to parse become null; absent columns are skipped.
pub fn clean(mut table: OrderTable) -> OrderTable {
    for name in columns::DATE_COLUMNS {
        coerce_column(&mut table, name, coerce_date);
    }
    for name in columns::NUMERIC_COLUMNS {
        coerce_column(&mut table, name, coerce_number);
    }
    derive_month(&mut table);
    table
}

fn coerce_column(table: &mut OrderTable, name: &str, coerce: fn(&Value) -> Value) {
    let Some(before) = table.column(name).map(|c| c.filter(|v| !v.is_null()).count()) else {
        return;
    };
    table.map_column(name, coerce);

    let after = table
        .column(name)
        .map(|c| c.filter(|v| !v.is_null()).count())
        .unwrap_or(0);
    if after < before {
        warn!(
            "column '{}': {} value(s) could not be parsed and were set to null",
            name,
            before - after
        );
    } else {
        debug!("column '{}': coerced {} value(s)", name, after);
    }
}

/// Add (or refresh) the `Month` column as `YYYY-MM` from the order date.
///
/// Requires `Order Date` to be coerced already; rows without a date get null.
pub fn derive_month(table: &mut OrderTable) {
    let Some(dates) = table.column(columns::ORDER_DATE) else {
        return;
    };
    let months: Vec<Value> = dates
        .map(|v| match v.as_date() {
            Some(d) => Value::Text(d.format("%Y-%m").to_string()),
            None => Value::Null,
        })
        .collect();
    table.set_column(columns::MONTH, months);
}
