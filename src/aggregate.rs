use crate::table::{OrderTable, columns};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Headline numbers for the filtered rows.
///
/// A metric is `None` when its column is not in the table.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Summary {
    pub rows: usize,
    pub transactions: Option<usize>,
    pub orders: Option<usize>,
    pub customers: Option<usize>,
    pub total_payment: Option<f64>,
    pub sub_total: Option<f64>,
    pub discount: Option<f64>,
    pub balance: Option<f64>,
    pub quantity: Option<f64>,
}

/// One labelled number: a month, a status, a product.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub value: f64,
}

/// One row of a multi-metric group-by.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupRow {
    pub key: String,
    pub values: Vec<f64>,
}

pub fn summarize(table: &OrderTable) -> Summary {
    Summary {
        rows: table.len(),
        transactions: count_distinct(table, columns::TRX_ID),
        orders: count_distinct(table, columns::ORDER_ID),
        customers: count_distinct(table, columns::CREATED_BY),
        total_payment: sum(table, columns::TOTAL_PAYMENT),
        sub_total: sum(table, columns::SUB_TOTAL),
        discount: sum(table, columns::DISCOUNT),
        balance: sum(table, columns::BALANCE),
        quantity: sum(table, columns::QTY),
    }
}

/// Number of distinct non-null values.
pub fn count_distinct(table: &OrderTable, column: &str) -> Option<usize> {
    let values = table.column(column)?;
    Some(values.filter_map(|v| v.group_key()).collect::<HashSet<_>>().len())
}

/// Sum of the numeric values of a column, skipping nulls.
pub fn sum(table: &OrderTable, column: &str) -> Option<f64> {
    let values = table.column(column)?;
    Some(values.filter_map(|v| v.as_number()).sum())
}

/// `metric` summed per `Month`, oldest month first.
pub fn monthly_trend(table: &OrderTable, metric: &str) -> Option<Vec<Bucket>> {
    let months = table.column_index(columns::MONTH)?;
    let metric = table.column_index(metric)?;

    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for row in table.rows() {
        let Some(month) = row[months].group_key() else {
            continue;
        };
        let total = totals.entry(month).or_insert(0.0);
        if let Some(v) = row[metric].as_number() {
            *total += v;
        }
    }

    Some(
        totals
            .into_iter()
            .map(|(label, value)| Bucket { label, value })
            .collect(),
    )
}

/// Row count per distinct value, most frequent first.
pub fn value_counts(table: &OrderTable, column: &str) -> Option<Vec<Bucket>> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for key in table.column(column)?.filter_map(|v| v.group_key()) {
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut buckets: Vec<Bucket> = counts
        .into_iter()
        .map(|(label, count)| Bucket {
            label,
            value: count as f64,
        })
        .collect();
    sort_descending(&mut buckets);
    Some(buckets)
}

/// `metric` summed per `key`, largest first, at most `n` entries.
pub fn top_n(table: &OrderTable, key: &str, metric: &str, n: usize) -> Option<Vec<Bucket>> {
    let mut buckets: Vec<Bucket> = group_totals(table, key, &[metric])?
        .into_iter()
        .map(|row| Bucket {
            label: row.key,
            value: row.values[0],
        })
        .collect();
    sort_descending(&mut buckets);
    buckets.truncate(n);
    Some(buckets)
}

/// Several metrics summed per `key`, sorted descending by the first metric.
///
/// Returns `None` if the key or any metric column is missing. Rows with a
/// null key are dropped; null metric cells count as zero.
pub fn group_totals(table: &OrderTable, key: &str, metrics: &[&str]) -> Option<Vec<GroupRow>> {
    let key_idx = table.column_index(key)?;
    let metric_idx: Vec<usize> = metrics
        .iter()
        .map(|m| table.column_index(m))
        .collect::<Option<_>>()?;

    let mut groups: HashMap<String, Vec<f64>> = HashMap::new();
    for row in table.rows() {
        let Some(group) = row[key_idx].group_key() else {
            continue;
        };
        let totals = groups
            .entry(group)
            .or_insert_with(|| vec![0.0; metric_idx.len()]);
        for (total, &idx) in totals.iter_mut().zip(&metric_idx) {
            if let Some(v) = row[idx].as_number() {
                *total += v;
            }
        }
    }

    let mut rows: Vec<GroupRow> = groups
        .into_iter()
        .map(|(key, values)| GroupRow { key, values })
        .collect();
    rows.sort_by(|a, b| {
        let first = |r: &GroupRow| r.values.first().copied().unwrap_or(0.0);
        first(b)
            .partial_cmp(&first(a))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
    Some(rows)
}

fn sort_descending(buckets: &mut [Bucket]) {
    buckets.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
}
