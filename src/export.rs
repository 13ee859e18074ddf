use crate::error::{DashboardError, Result};
use crate::table::{OrderTable, Value};

/// File name offered for the filtered CSV download.
pub const CSV_FILE_NAME: &str = "filtered_orders.csv";
/// File name offered for the filtered XLSX download.
pub const XLSX_FILE_NAME: &str = "filtered_orders.xlsx";

/// Convert the table to CSV bytes
///
/// Writes a header row followed by one record per row. Dates are written as
/// `YYYY-MM-DD` (with `HH:MM:SS` when they carry a time), numbers in their
/// shortest exact form and nulls as empty fields, so the output parses back
/// into an equivalent table. Quoting is left to the `csv` writer.
///
/// # Examples
/// ```
/// use sales_dashboard::export::to_csv;
/// use sales_dashboard::loader::from_bytes;
///
/// let table = from_bytes(b"TrxID,Qty\nT1,2\n").unwrap();
/// let bytes = to_csv(&table).unwrap();
/// assert_eq!(String::from_utf8(bytes).unwrap(), "TrxID,Qty\nT1,2\n");
/// ```
pub fn to_csv(table: &OrderTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.headers())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(Value::to_string))?;
    }
    writer
        .into_inner()
        .map_err(|e| DashboardError::Io(e.into_error()))
}

/// Convert the table to XLSX bytes
///
/// Numbers are written as numbers, dates as `YYYY-MM-DD` text and nulls are
/// left blank. The header row is bold.
#[cfg(feature = "web")]
pub fn to_xlsx(table: &OrderTable) -> Result<Vec<u8>> {
    use rust_xlsxwriter::{Format, Workbook};

    let workbook_error = |e: rust_xlsxwriter::XlsxError| DashboardError::Workbook(e.to_string());

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    for (c, header) in table.headers().iter().enumerate() {
        worksheet
            .write_string_with_format(0, c as u16, header, &bold)
            .map_err(workbook_error)?;
    }

    for (r, row) in table.rows().iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, value) in row.iter().enumerate() {
            let c = c as u16;
            match value {
                Value::Null => {}
                Value::Number(n) => {
                    worksheet.write_number(r, c, *n).map_err(workbook_error)?;
                }
                other => {
                    worksheet
                        .write_string(r, c, other.to_string())
                        .map_err(workbook_error)?;
                }
            }
        }
    }

    workbook.save_to_buffer().map_err(workbook_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::clean;
    use crate::filter::FilterPanel;
    use crate::loader::from_bytes;

    const ORDERS: &str = "TrxID,Order Date,Product Name,Total Payment,Qty,Note\n\
        T1,05/01/2024,\"Mug, large\",\"Rp 100.000\",2,\"said \"\"hi\"\"\"\n\
        T2,2024-01-20 09:15:00,Shirt,12.75,1,\n\
        T3,2024-02-02,Hat,oops,,plain\n";

    #[test]
    fn export_round_trips_through_loader_and_cleaning() {
        let table = clean(from_bytes(ORDERS.as_bytes()).unwrap());
        let filtered = FilterPanel::default().apply(&table);

        let bytes = to_csv(&filtered).unwrap();
        let reparsed = clean(from_bytes(&bytes).unwrap());

        assert_eq!(reparsed, filtered);
    }

    #[test]
    fn fractional_seconds_survive_export() {
        let csv = "TrxID,Order Date,Total Payment\n\
            T1,2024-03-05 13:45:10.250,10\n\
            T2,2024-03-05T08:00:00.000123,20\n";
        let table = clean(from_bytes(csv.as_bytes()).unwrap());

        let bytes = to_csv(&table).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("T1,2024-03-05 13:45:10.250,10,2024-03"));

        let reparsed = clean(from_bytes(&bytes).unwrap());
        assert_eq!(reparsed, table);
    }

    #[test]
    fn export_formats_cleaned_values() {
        let table = clean(from_bytes(ORDERS.as_bytes()).unwrap());
        let text = String::from_utf8(to_csv(&table).unwrap()).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("TrxID,Order Date,Product Name,Total Payment,Qty,Note,Month")
        );
        assert_eq!(
            lines.next(),
            Some("T1,2024-01-05,\"Mug, large\",100000,2,\"said \"\"hi\"\"\",2024-01")
        );
        assert_eq!(
            lines.next(),
            Some("T2,2024-01-20 09:15:00,Shirt,12.75,1,,2024-01")
        );
        assert_eq!(lines.next(), Some("T3,2024-02-02,Hat,,,plain,2024-02"));
    }

    #[test]
    fn empty_table_exports_header_only() {
        let table = from_bytes(b"TrxID,Qty\n").unwrap();
        assert_eq!(to_csv(&table).unwrap(), b"TrxID,Qty\n");
    }

    #[cfg(feature = "web")]
    #[test]
    fn xlsx_export_produces_a_zip_container() {
        let table = clean(from_bytes(ORDERS.as_bytes()).unwrap());
        let bytes = to_xlsx(&table).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
