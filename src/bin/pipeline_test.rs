use chrono::NaiveDate;
use sales_dashboard::aggregate;
use sales_dashboard::cleaning::{clean, parse_amount, parse_date};
use sales_dashboard::export::to_csv;
use sales_dashboard::loader::from_bytes;
use sales_dashboard::table::{OrderTable, Value, columns};
use sales_dashboard::{FilterPanel, ReportOptions, build_report};

const ORDERS: &str = "\
TrxID,Order ID,Order Date,Payment Status,Order Status,Product Type,Order Source,Partner,Product Name,Created By,Total Payment,Sub Total,Discount,Balance,Qty
T001,O-1,03/01/2024,Paid,Completed,Physical,Website,Acme,Coffee Mug,alice,\"Rp 150.000\",160000,10000,0,3
T002,O-2,2024-01-15 10:30:00,Unpaid,Pending,Digital,Marketplace,Globex,E-book,bob,45000,45000,0,45000,1
T003,O-3,2024-02-02,Paid,Completed,Physical,Website,Acme,T-Shirt,alice,\"250,000\",250000,0,0,2
T004,O-4,not a date,Paid,Completed,Physical,Website,Initech,Coffee Mug,carol,90000,90000,0,0,1
T005,O-5,2024-03-10,Partially Paid,Processing,Physical,Reseller,Globex,Coffee Mug,bob,oops,120000,5000,30000,4
";

fn load() -> OrderTable {
    clean(from_bytes(ORDERS.as_bytes()).unwrap())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// Test coercion helpers on the formats found in real exports
fn test_parsing() {
    println!("\n====== Testing value parsing ======");

    assert_eq!(parse_amount("Rp 150.000"), Some(150000.0));
    assert_eq!(parse_amount("250,000"), Some(250000.0));
    assert_eq!(parse_amount("12.5"), Some(12.5));
    assert_eq!(parse_amount("oops"), None);
    println!("✓ Amounts with currency markers and separators parsed");

    assert!(parse_date("2024-01-15 10:30:00").is_some());
    assert_eq!(
        parse_date("03/01/2024").map(|d| d.date()),
        Some(date(2024, 1, 3))
    );
    assert_eq!(parse_date("not a date"), None);
    println!("✓ Dates parsed day-first, garbage rejected");
}

// Test loading and cleaning the sample export
fn test_cleaning() {
    println!("\n====== Testing load and clean ======");
    let table = load();

    assert_eq!(table.len(), 5);
    assert!(table.has_column(columns::MONTH));
    println!("✓ Loaded {} rows with derived Month column", table.len());

    assert_eq!(
        table.value(0, columns::TOTAL_PAYMENT),
        Some(&Value::Number(150000.0))
    );
    assert!(table.value(4, columns::TOTAL_PAYMENT).unwrap().is_null());
    println!("✓ Invalid amount became null");

    assert!(table.value(3, columns::ORDER_DATE).unwrap().is_null());
    assert!(table.value(3, columns::MONTH).unwrap().is_null());
    assert_eq!(
        table.value(1, columns::MONTH),
        Some(&Value::Text("2024-01".to_string()))
    );
    println!("✓ Invalid date became null and has no month");
}

// Test sequential filtering
fn test_filters() {
    println!("\n====== Testing filters ======");
    let table = load();

    let all = FilterPanel::default().apply(&table);
    assert_eq!(all.len(), 4);
    println!("✓ Default panel keeps every row with a valid order date");

    let january = FilterPanel {
        start_date: Some(date(2024, 1, 1)),
        end_date: Some(date(2024, 1, 31)),
        ..Default::default()
    }
    .apply(&table);
    assert_eq!(january.len(), 2);
    for d in january.column(columns::ORDER_DATE).unwrap() {
        let d = d.as_date().unwrap().date();
        assert!(d >= date(2024, 1, 1) && d <= date(2024, 1, 31));
    }
    println!("✓ Date range is inclusive and exact");

    let paid_web = FilterPanel {
        payment_status: vec!["Paid".to_string()],
        order_source: vec!["Website".to_string()],
        ..Default::default()
    }
    .apply(&table);
    assert_eq!(paid_web.len(), 2);
    println!("✓ Categorical filters narrow sequentially");

    let nothing = FilterPanel {
        product_type: vec!["Service".to_string()],
        ..Default::default()
    }
    .apply(&table);
    assert!(nothing.is_empty());
    println!("✓ Unknown selection yields an empty table");
}

// Test aggregates against hand-computed totals
fn test_report() {
    println!("\n====== Testing dashboard report ======");
    let table = load();
    let options = ReportOptions {
        top_n: 2,
        preview_rows: 5,
    };
    let report = build_report(&table, &FilterPanel::default(), &options);

    assert_eq!(report.summary.total_payment, Some(445000.0));
    assert_eq!(report.summary.quantity, Some(10.0));
    assert_eq!(report.summary.transactions, Some(4));
    println!("✓ Summary totals equal column sums over filtered rows");

    let trend = report.monthly_trend.unwrap();
    let labels: Vec<&str> = trend.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["2024-01", "2024-02", "2024-03"]);
    println!("✓ Monthly trend is chronological");

    let top = report.top_products.unwrap();
    assert!(top.len() <= 2);
    assert!(top.windows(2).all(|w| w[0].value >= w[1].value));
    assert_eq!(top[0].label, "Coffee Mug");
    println!("✓ Top products sorted descending and capped at N");

    let partners = aggregate::group_totals(
        &report.filtered,
        columns::PARTNER,
        &[columns::TOTAL_PAYMENT, columns::QTY],
    )
    .unwrap();
    assert_eq!(partners[0].key, "Acme");
    println!("✓ Partner table ranks by total payment");
}

// Test that exported CSV loads back into the same table
fn test_export() {
    println!("\n====== Testing export round trip ======");
    let table = load();
    let filtered = FilterPanel {
        payment_status: vec!["Paid".to_string(), "Unpaid".to_string()],
        ..Default::default()
    }
    .apply(&table);

    let bytes = to_csv(&filtered).unwrap();
    let reloaded = clean(from_bytes(&bytes).unwrap());
    assert_eq!(reloaded, filtered);
    println!("✓ Exported {} bytes round-trip to an equal table", bytes.len());
}

fn main() {
    test_parsing();
    test_cleaning();
    test_filters();
    test_report();
    test_export();
    println!("\nAll pipeline tests passed!");
}
