#![cfg(feature = "web")]
use crate::aggregate::{Bucket, GroupRow, Summary};
use crate::dashboard::DashboardReport;
use crate::error::{DashboardError, Result};
use crate::filter::FilterPanel;
use crate::graph::{self, GraphOptions};
use crate::table::OrderTable;
use handlebars::Handlebars;
use serde::Serialize;

/// Compiled page templates.
pub struct Renderer {
    registry: Handlebars<'static>,
}

#[derive(Serialize)]
struct TableView {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

#[derive(Serialize)]
struct Metric {
    label: &'static str,
    value: String,
}

#[derive(Serialize)]
struct Section {
    title: &'static str,
    chart: Option<String>,
    table: Option<TableView>,
}

#[derive(Serialize)]
struct OptionView {
    value: String,
    selected: bool,
}

#[derive(Serialize)]
struct SelectView {
    name: &'static str,
    label: &'static str,
    options: Vec<OptionView>,
}

#[derive(Serialize)]
struct DashboardView<'a> {
    title: &'a str,
    dataset_id: &'a str,
    total_rows: String,
    filtered_rows: String,
    start: String,
    end: String,
    min_date: String,
    max_date: String,
    selects: Vec<SelectView>,
    preview: TableView,
    metrics: Vec<Metric>,
    sections: Vec<Section>,
    empty: bool,
    export_csv: String,
    export_xlsx: String,
}

#[derive(Serialize)]
struct UploadView {
    max_upload_mb: usize,
}

#[derive(Serialize)]
struct ErrorView<'a> {
    message: &'a str,
}

impl Renderer {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        let templates = [
            ("upload", include_str!("./static/upload.html")),
            ("dashboard", include_str!("./static/dashboard.html")),
            ("error", include_str!("./static/error.html")),
        ];
        for (name, source) in templates {
            registry
                .register_template_string(name, source)
                .map_err(|e| DashboardError::Render(e.to_string()))?;
        }
        Ok(Renderer { registry })
    }

    fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        self.registry
            .render(name, data)
            .map_err(|e| DashboardError::Render(e.to_string()))
    }

    /// Landing page with the upload form.
    pub fn upload_page(&self, max_upload_bytes: usize) -> Result<String> {
        self.render(
            "upload",
            &UploadView {
                max_upload_mb: max_upload_bytes / (1024 * 1024),
            },
        )
    }

    /// The single user-facing message for any failure.
    pub fn error_page(&self, message: &str) -> Result<String> {
        self.render("error", &ErrorView { message })
    }

    pub fn dashboard_page(
        &self,
        dataset_id: &str,
        title: &str,
        report: &DashboardReport,
        currency: &str,
    ) -> Result<String> {
        let money = |v: f64| format_amount(v, currency);
        let (start, end) = report
            .date_range
            .map(|(lo, hi)| (lo.to_string(), hi.to_string()))
            .unwrap_or_default();
        let options = &report.filter_options;
        let query = filter_query(&report.panel);

        let view = DashboardView {
            title,
            dataset_id,
            total_rows: format_count(report.total_rows as f64),
            filtered_rows: format_count(report.filtered.len() as f64),
            start,
            end,
            min_date: options.min_date.map(|d| d.to_string()).unwrap_or_default(),
            max_date: options.max_date.map(|d| d.to_string()).unwrap_or_default(),
            selects: vec![
                select(
                    "payment_status",
                    "Payment status",
                    &options.payment_status,
                    &report.panel.payment_status,
                ),
                select(
                    "order_status",
                    "Order status",
                    &options.order_status,
                    &report.panel.order_status,
                ),
                select(
                    "product_type",
                    "Product type",
                    &options.product_type,
                    &report.panel.product_type,
                ),
                select(
                    "order_source",
                    "Order source",
                    &options.order_source,
                    &report.panel.order_source,
                ),
            ]
            .into_iter()
            .flatten()
            .collect(),
            preview: table_view(&report.preview),
            metrics: metrics(&report.summary, &money),
            sections: sections(report, &money)?,
            empty: report.filtered.is_empty(),
            export_csv: format!("/dashboard/{}/export.csv{}", dataset_id, query),
            export_xlsx: format!("/dashboard/{}/export.xlsx{}", dataset_id, query),
        };

        self.render("dashboard", &view)
    }
}

fn select(
    name: &'static str,
    label: &'static str,
    choices: &[String],
    selected: &[String],
) -> Option<SelectView> {
    if choices.is_empty() {
        return None;
    }
    Some(SelectView {
        name,
        label,
        options: choices
            .iter()
            .map(|value| OptionView {
                value: value.clone(),
                selected: selected.contains(value),
            })
            .collect(),
    })
}

fn table_view(table: &OrderTable) -> TableView {
    TableView {
        headers: table.headers().to_vec(),
        rows: table
            .rows()
            .iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect(),
    }
}

fn metrics(summary: &Summary, money: &dyn Fn(f64) -> String) -> Vec<Metric> {
    let candidates = [
        ("Total transactions", summary.transactions.map(|n| format_count(n as f64))),
        ("Total payment", summary.total_payment.map(money)),
        ("Total discount", summary.discount.map(money)),
        ("Products sold", summary.quantity.map(format_count)),
        ("Orders", summary.orders.map(|n| format_count(n as f64))),
        ("Sub total", summary.sub_total.map(money)),
        ("Outstanding balance", summary.balance.map(money)),
        ("Customers", summary.customers.map(|n| format_count(n as f64))),
    ];
    candidates
        .into_iter()
        .filter_map(|(label, value)| value.map(|value| Metric { label, value }))
        .collect()
}

fn sections(report: &DashboardReport, money: &dyn Fn(f64) -> String) -> Result<Vec<Section>> {
    let mut sections = Vec::new();

    if let Some(trend) = &report.monthly_trend {
        let options = GraphOptions::titled("Monthly payment trend").labels("Month", "Total payment");
        sections.push(Section {
            title: "Sales trend per month",
            chart: Some(graph::line_chart(trend, &options)?),
            table: None,
        });
    }

    if let Some(statuses) = &report.payment_status {
        let options = GraphOptions::titled("Payment status distribution").size(600, 400);
        sections.push(Section {
            title: "Payment status",
            chart: Some(graph::pie_chart(statuses, &options)?),
            table: Some(bucket_table("Status", "Rows", statuses, &format_count)),
        });
    }

    if let Some(products) = &report.top_products {
        let height = 120 + 36 * products.len().max(1) as u32;
        let options = GraphOptions::titled("Top products by quantity")
            .labels("Quantity", "")
            .size(800, height);
        sections.push(Section {
            title: "Best-selling products",
            chart: Some(graph::bar_chart(products, &options)?),
            table: None,
        });
    }

    if let Some(partners) = &report.partners {
        sections.push(Section {
            title: "Partner performance",
            chart: None,
            table: Some(group_table("Partner", partners, money)),
        });
    }

    if let Some(customers) = &report.top_customers {
        sections.push(Section {
            title: "Top customers",
            chart: None,
            table: Some(bucket_table("Created by", "Total payment", customers, money)),
        });
    }

    if let Some(sources) = &report.order_sources {
        sections.push(Section {
            title: "Revenue by order source",
            chart: None,
            table: Some(group_table("Order source", sources, money)),
        });
    }

    if let Some(statuses) = &report.order_status {
        sections.push(Section {
            title: "Order status",
            chart: None,
            table: Some(bucket_table("Status", "Rows", statuses, &format_count)),
        });
    }

    Ok(sections)
}

fn bucket_table(
    key: &str,
    metric: &str,
    buckets: &[Bucket],
    format: &dyn Fn(f64) -> String,
) -> TableView {
    TableView {
        headers: vec![key.to_string(), metric.to_string()],
        rows: buckets
            .iter()
            .map(|b| vec![b.label.clone(), format(b.value)])
            .collect(),
    }
}

/// Rows of `(key, total payment, quantity)`.
fn group_table(key: &str, rows: &[GroupRow], money: &dyn Fn(f64) -> String) -> TableView {
    TableView {
        headers: vec![
            key.to_string(),
            "Total payment".to_string(),
            "Qty".to_string(),
        ],
        rows: rows
            .iter()
            .map(|row| {
                let payment = row.values.first().copied().unwrap_or(0.0);
                let qty = row.values.get(1).copied().unwrap_or(0.0);
                vec![row.key.clone(), money(payment), format_count(qty)]
            })
            .collect(),
    }
}

/// Query string reproducing the panel, e.g. `?start=2024-01-01&payment_status=Paid`.
pub fn filter_query(panel: &FilterPanel) -> String {
    let mut pairs: Vec<(&str, String)> = Vec::new();
    if let Some(start) = panel.start_date {
        pairs.push(("start", start.to_string()));
    }
    if let Some(end) = panel.end_date {
        pairs.push(("end", end.to_string()));
    }
    let named = [
        ("payment_status", &panel.payment_status),
        ("order_status", &panel.order_status),
        ("product_type", &panel.product_type),
        ("order_source", &panel.order_source),
    ];
    for (name, values) in named {
        for value in values {
            pairs.push((name, value.clone()));
        }
    }

    if pairs.is_empty() {
        return String::new();
    }
    let encoded: Vec<String> = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect();
    format!("?{}", encoded.join("&"))
}

/// `1234567.4` -> `1,234,567`
pub fn format_count(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// `1234567.0` with `Rp` -> `Rp 1,234,567`
pub fn format_amount(value: f64, currency: &str) -> String {
    if currency.is_empty() {
        format_count(value)
    } else {
        format!("{} {}", currency, format_count(value))
    }
}
