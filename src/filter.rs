use crate::error::{DashboardError, Result};
use crate::table::{OrderTable, Value, columns};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The user-adjustable constraints narrowing the visible rows.
///
/// An empty selection list means "all values".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterPanel {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_status: Vec<String>,
    #[serde(default)]
    pub order_status: Vec<String>,
    #[serde(default)]
    pub product_type: Vec<String>,
    #[serde(default)]
    pub order_source: Vec<String>,
}

impl FilterPanel {
    /// Parse a `YYYY-MM-DD` widget value; blank means unset.
    pub fn parse_bound(field: &'static str, raw: Option<&str>) -> Result<Option<NaiveDate>> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| DashboardError::Filter {
                    field,
                    value: text.to_string(),
                }),
        }
    }

    /// The categorical selections, paired with the column each one filters.
    pub fn selections(&self) -> [(&'static str, &[String]); 4] {
        [
            (columns::PAYMENT_STATUS, self.payment_status.as_slice()),
            (columns::ORDER_STATUS, self.order_status.as_slice()),
            (columns::PRODUCT_TYPE, self.product_type.as_slice()),
            (columns::ORDER_SOURCE, self.order_source.as_slice()),
        ]
    }

    /// Date bounds actually applied: explicit values, else the table's own range.
    pub fn effective_range(&self, table: &OrderTable) -> Option<(NaiveDate, NaiveDate)> {
        let (lo, hi) = table.date_bounds(columns::ORDER_DATE)?;
        Some((self.start_date.unwrap_or(lo), self.end_date.unwrap_or(hi)))
    }

    /// Narrow the table one filter at a time, each working on the previous output.
    ///
    /// The date filter runs whenever `Order Date` exists, so rows without an
    /// order date are always dropped. A filter whose column is absent does nothing.
    pub fn apply(&self, table: &OrderTable) -> OrderTable {
        let mut current = self.apply_date_range(table);

        for (column, selected) in self.selections() {
            if selected.is_empty() {
                continue;
            }
            let before = current.len();
            current = current.filter_column(column, |v| {
                v.group_key().is_some_and(|key| selected.contains(&key))
            });
            debug!("filter '{}': {} -> {} rows", column, before, current.len());
        }

        current
    }

    fn apply_date_range(&self, table: &OrderTable) -> OrderTable {
        if !table.has_column(columns::ORDER_DATE) {
            return table.clone();
        }
        let Some((start, end)) = self.effective_range(table) else {
            // no parseable order dates at all
            return table.filter_column(columns::ORDER_DATE, |_| false);
        };

        let filtered = table.filter_column(columns::ORDER_DATE, |v| {
            v.as_date()
                .map(|d| d.date())
                .is_some_and(|day| start <= day && day <= end)
        });
        debug!(
            "filter 'Order Date' {}..={}: {} -> {} rows",
            start,
            end,
            table.len(),
            filtered.len()
        );
        filtered
    }

    /// True when no widget deviates from its default.
    pub fn is_default(&self) -> bool {
        *self == FilterPanel::default()
    }
}

/// Widget choices derived from the unfiltered table.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub payment_status: Vec<String>,
    pub order_status: Vec<String>,
    pub product_type: Vec<String>,
    pub order_source: Vec<String>,
}

impl FilterOptions {
    pub fn from_table(table: &OrderTable) -> Self {
        let bounds = table.date_bounds(columns::ORDER_DATE);
        FilterOptions {
            min_date: bounds.map(|(lo, _)| lo),
            max_date: bounds.map(|(_, hi)| hi),
            payment_status: distinct_values(table, columns::PAYMENT_STATUS),
            order_status: distinct_values(table, columns::ORDER_STATUS),
            product_type: distinct_values(table, columns::PRODUCT_TYPE),
            order_source: distinct_values(table, columns::ORDER_SOURCE),
        }
    }
}

/// Sorted distinct non-null values of a column; empty if the column is absent.
pub fn distinct_values(table: &OrderTable, column: &str) -> Vec<String> {
    table
        .column(column)
        .map(|values| {
            values
                .filter_map(Value::group_key)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::clean;
    use crate::loader::from_bytes;

    const ORDERS: &str = "TrxID,Order Date,Payment Status,Order Status,Product Type,Order Source,Total Payment\n\
        T1,2024-01-01,Paid,Done,Course,Web,100\n\
        T2,2024-01-15 18:30:00,Paid,Done,Book,App,200\n\
        T3,2024-02-01,Unpaid,Pending,Course,Web,300\n\
        T4,,Paid,Done,Course,Web,400\n\
        T5,2024-03-10,Refund,Cancelled,Book,Web,500\n";

    fn orders() -> OrderTable {
        clean(from_bytes(ORDERS.as_bytes()).unwrap())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ids(table: &OrderTable) -> Vec<String> {
        table
            .column("TrxID")
            .unwrap()
            .map(|v| v.to_string())
            .collect()
    }

    #[test]
    fn default_panel_drops_rows_without_order_date() {
        let filtered = FilterPanel::default().apply(&orders());
        assert_eq!(ids(&filtered), ["T1", "T2", "T3", "T5"]);
    }

    #[test]
    fn date_range_is_inclusive_by_day() {
        let panel = FilterPanel {
            start_date: Some(date(2024, 1, 1)),
            end_date: Some(date(2024, 1, 15)),
            ..Default::default()
        };
        let filtered = panel.apply(&orders());
        assert_eq!(ids(&filtered), ["T1", "T2"]);

        for day in filtered
            .column(columns::ORDER_DATE)
            .unwrap()
            .filter_map(|v| v.as_date())
        {
            assert!(day.date() >= date(2024, 1, 1) && day.date() <= date(2024, 1, 15));
        }
    }

    #[test]
    fn inverted_range_is_empty() {
        let panel = FilterPanel {
            start_date: Some(date(2024, 3, 1)),
            end_date: Some(date(2024, 1, 1)),
            ..Default::default()
        };
        assert!(panel.apply(&orders()).is_empty());
    }

    #[test]
    fn categorical_filters_chain() {
        let panel = FilterPanel {
            payment_status: vec!["Paid".to_string(), "Refund".to_string()],
            product_type: vec!["Book".to_string()],
            ..Default::default()
        };
        assert_eq!(ids(&panel.apply(&orders())), ["T2", "T5"]);

        let panel = FilterPanel {
            order_source: vec!["Web".to_string()],
            order_status: vec!["Done".to_string()],
            ..Default::default()
        };
        assert_eq!(ids(&panel.apply(&orders())), ["T1"]);
    }

    #[test]
    fn missing_columns_are_ignored() {
        let table = clean(from_bytes(b"TrxID,Qty\nT1,1\nT2,2\n").unwrap());
        let panel = FilterPanel {
            start_date: Some(date(2030, 1, 1)),
            payment_status: vec!["Paid".to_string()],
            ..Default::default()
        };
        assert_eq!(panel.apply(&table).len(), 2);
    }

    #[test]
    fn options_are_distinct_and_sorted() {
        let options = FilterOptions::from_table(&orders());
        assert_eq!(options.payment_status, ["Paid", "Refund", "Unpaid"]);
        assert_eq!(options.product_type, ["Book", "Course"]);
        assert_eq!(options.min_date, Some(date(2024, 1, 1)));
        assert_eq!(options.max_date, Some(date(2024, 3, 10)));
    }

    #[test]
    fn bounds_parse_or_fail_loudly() {
        assert_eq!(FilterPanel::parse_bound("start", None).unwrap(), None);
        assert_eq!(FilterPanel::parse_bound("start", Some(" ")).unwrap(), None);
        assert_eq!(
            FilterPanel::parse_bound("start", Some("2024-02-29")).unwrap(),
            Some(date(2024, 2, 29))
        );
        assert!(matches!(
            FilterPanel::parse_bound("end", Some("29/02/2024")),
            Err(DashboardError::Filter { field: "end", .. })
        ));
    }
}
