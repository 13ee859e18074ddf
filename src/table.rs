use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;

/// Header names the dashboard knows how to use.
///
/// None of them is required: every consumer checks presence first.
pub mod columns {
    pub const TRX_ID: &str = "TrxID";
    pub const ORDER_ID: &str = "Order ID";

    pub const ORDER_DATE: &str = "Order Date";
    pub const INVOICE_DATE: &str = "Invoice Date";
    pub const PAYMENT_STATUS_DATE: &str = "Payment Status Date";
    pub const START_DATE: &str = "Start Date";
    pub const END_DATE: &str = "End Date";

    pub const TOTAL_PAYMENT: &str = "Total Payment";
    pub const SUB_TOTAL: &str = "Sub Total";
    pub const DISCOUNT: &str = "Discount";
    pub const BALANCE: &str = "Balance";
    pub const QTY: &str = "Qty";

    pub const PAYMENT_STATUS: &str = "Payment Status";
    pub const ORDER_STATUS: &str = "Order Status";
    pub const PRODUCT_TYPE: &str = "Product Type";
    pub const ORDER_SOURCE: &str = "Order Source";
    pub const PARTNER: &str = "Partner";
    pub const PRODUCT_NAME: &str = "Product Name";
    pub const CREATED_BY: &str = "Created By";

    /// Derived `YYYY-MM` key.
    pub const MONTH: &str = "Month";

    pub const DATE_COLUMNS: [&str; 5] = [
        ORDER_DATE,
        INVOICE_DATE,
        PAYMENT_STATUS_DATE,
        START_DATE,
        END_DATE,
    ];

    pub const NUMERIC_COLUMNS: [&str; 5] = [TOTAL_PAYMENT, SUB_TOTAL, DISCOUNT, BALANCE, QTY];
}

/// A single cell of the order table.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Text key used for grouping and categorical filters.
    ///
    /// Numbers and dates group by their display form; nulls never form a group.
    pub fn group_key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Date(d) => {
                if d.time() == NaiveTime::MIN {
                    write!(f, "{}", d.format("%Y-%m-%d"))
                } else if d.nanosecond() != 0 {
                    write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S%.f"))
                } else {
                    write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S"))
                }
            }
        }
    }
}

/// The order record table: named columns over row-major cells.
///
/// Every row holds exactly `headers.len()` values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderTable {
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl OrderTable {
    /// Build a table, padding short rows with nulls and truncating long ones.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();
        OrderTable { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterate the values of one column, or `None` if the column is absent.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Value> + use<'a>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Replace a column's values, or append it as a new column.
    ///
    /// `values` must have one entry per row; missing entries become null.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) {
        let mut values = values;
        values.resize(self.rows.len(), Value::Null);

        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Rewrite every value of a column in place. No-op if the column is absent.
    pub fn map_column(&mut self, name: &str, f: impl Fn(&Value) -> Value) {
        if let Some(idx) = self.column_index(name) {
            for row in self.rows.iter_mut() {
                row[idx] = f(&row[idx]);
            }
        }
    }

    /// Keep the rows whose mask entry is true.
    pub fn retain_rows(&self, mask: &[bool]) -> OrderTable {
        let rows = self
            .rows
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(row, _)| row.clone())
            .collect();
        OrderTable {
            headers: self.headers.clone(),
            rows,
        }
    }

    /// Keep the rows for which `predicate` holds on the given column.
    ///
    /// Returns an unchanged copy when the column is absent.
    pub fn filter_column(&self, name: &str, predicate: impl Fn(&Value) -> bool) -> OrderTable {
        match self.column_index(name) {
            Some(idx) => {
                let mask: Vec<bool> = self.rows.iter().map(|row| predicate(&row[idx])).collect();
                self.retain_rows(&mask)
            }
            None => self.clone(),
        }
    }

    pub fn head(&self, n: usize) -> OrderTable {
        OrderTable {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Earliest and latest calendar day in a date column.
    pub fn date_bounds(&self, name: &str) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.column(name)?.filter_map(|v| v.as_date().map(|d| d.date()));
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}
