use crate::aggregate::{self, Bucket, GroupRow, Summary};
use crate::filter::{FilterOptions, FilterPanel};
use crate::table::{OrderTable, columns};
use chrono::NaiveDate;
use log::info;

/// Knobs for one dashboard run.
#[derive(Clone, Debug)]
pub struct ReportOptions {
    /// Length of the ranking sections.
    pub top_n: usize,
    /// Rows shown in the raw data preview.
    pub preview_rows: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            top_n: 10,
            preview_rows: 5,
        }
    }
}

/// Everything one dashboard page shows, computed from scratch per request.
///
/// Sections whose columns are missing are `None`.
#[derive(Clone, Debug)]
pub struct DashboardReport {
    pub total_rows: usize,
    pub preview: OrderTable,
    pub filter_options: FilterOptions,
    pub panel: FilterPanel,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub filtered: OrderTable,
    pub summary: Summary,
    pub monthly_trend: Option<Vec<Bucket>>,
    pub payment_status: Option<Vec<Bucket>>,
    pub order_status: Option<Vec<Bucket>>,
    pub top_products: Option<Vec<Bucket>>,
    pub partners: Option<Vec<GroupRow>>,
    pub top_customers: Option<Vec<Bucket>>,
    pub order_sources: Option<Vec<GroupRow>>,
}

/// Filter the cleaned table and compute every section from the result.
pub fn build_report(
    table: &OrderTable,
    panel: &FilterPanel,
    options: &ReportOptions,
) -> DashboardReport {
    let filtered = panel.apply(table);
    info!(
        "dashboard run: {} of {} rows after filtering",
        filtered.len(),
        table.len()
    );

    DashboardReport {
        total_rows: table.len(),
        preview: table.head(options.preview_rows),
        filter_options: FilterOptions::from_table(table),
        panel: panel.clone(),
        date_range: panel.effective_range(table),
        summary: aggregate::summarize(&filtered),
        monthly_trend: aggregate::monthly_trend(&filtered, columns::TOTAL_PAYMENT),
        payment_status: aggregate::value_counts(&filtered, columns::PAYMENT_STATUS),
        order_status: aggregate::value_counts(&filtered, columns::ORDER_STATUS),
        top_products: aggregate::top_n(
            &filtered,
            columns::PRODUCT_NAME,
            columns::QTY,
            options.top_n,
        ),
        partners: aggregate::group_totals(
            &filtered,
            columns::PARTNER,
            &[columns::TOTAL_PAYMENT, columns::QTY],
        ),
        top_customers: aggregate::top_n(
            &filtered,
            columns::CREATED_BY,
            columns::TOTAL_PAYMENT,
            options.top_n,
        ),
        order_sources: aggregate::group_totals(
            &filtered,
            columns::ORDER_SOURCE,
            &[columns::TOTAL_PAYMENT, columns::QTY],
        ),
        filtered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::clean;
    use crate::loader::from_bytes;

    const ORDERS: &str = "TrxID,Order Date,Payment Status,Product Name,Partner,Total Payment,Qty\n\
        T1,2024-01-03,Paid,Mug,Acme,100,2\n\
        T2,2024-01-09,Paid,Hat,Acme,50,1\n\
        T3,2024-02-11,Unpaid,Mug,Globex,200,4\n\
        T4,2024-03-01,Paid,Cap,Globex,80,1\n";

    fn orders() -> OrderTable {
        clean(from_bytes(ORDERS.as_bytes()).unwrap())
    }

    #[test]
    fn sections_follow_available_columns() {
        let report = build_report(&orders(), &FilterPanel::default(), &ReportOptions::default());

        assert_eq!(report.total_rows, 4);
        assert_eq!(report.preview.len(), 4);
        assert_eq!(report.filtered.len(), 4);
        assert!(report.monthly_trend.is_some());
        assert!(report.payment_status.is_some());
        assert!(report.top_products.is_some());
        assert!(report.partners.is_some());
        assert!(report.order_status.is_none());
        assert!(report.top_customers.is_none());
        assert!(report.order_sources.is_none());
    }

    #[test]
    fn totals_reflect_filtered_rows_only() {
        let panel = FilterPanel {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31),
            ..Default::default()
        };
        let report = build_report(&orders(), &panel, &ReportOptions::default());

        assert_eq!(report.summary.total_payment, Some(150.0));
        assert_eq!(report.summary.quantity, Some(3.0));
        assert_eq!(report.preview.len(), 4, "preview shows the unfiltered head");
        assert_eq!(
            report.date_range,
            Some((
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
            ))
        );
    }

    #[test]
    fn rankings_respect_top_n() {
        let options = ReportOptions {
            top_n: 2,
            preview_rows: 1,
        };
        let report = build_report(&orders(), &FilterPanel::default(), &options);
        let top = report.top_products.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].label, "Mug");
        assert_eq!(report.preview.len(), 1);
    }
}
