use crate::error::{DashboardError, Result};
use crate::table::{OrderTable, Value};
use log::{debug, info};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Load an order table from any CSV source.
///
/// The first record is the header row. Every field is trimmed; empty fields
/// become `Value::Null` and everything else stays `Value::Text` until
/// [`crate::cleaning::clean`] coerces the known columns. Rows shorter than the
/// header are padded with nulls.
///
/// # Errors
/// * `DashboardError::Empty` if there is no header row
/// * `DashboardError::Csv` if the input is not valid UTF-8 CSV
pub fn from_reader<R: Read>(reader: R) -> Result<OrderTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{FEFF}').to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(DashboardError::Empty);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Value::Null
                } else {
                    Value::Text(field.to_string())
                }
            })
            .collect();
        rows.push(row);
    }

    debug!("parsed {} columns, {} rows", headers.len(), rows.len());
    Ok(OrderTable::new(headers, rows))
}

/// Load an order table from an uploaded payload.
pub fn from_bytes(bytes: &[u8]) -> Result<OrderTable> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(DashboardError::Empty);
    }
    from_reader(bytes)
}

/// Load an order table from a CSV file on disk.
///
/// # Examples
/// ```no_run
/// use sales_dashboard::loader::from_path;
///
/// match from_path("orders.csv") {
///     Ok(table) => println!("Loaded {} orders", table.len()),
///     Err(e) => eprintln!("Error loading CSV: {}", e),
/// }
/// ```
pub fn from_path(path: impl AsRef<Path>) -> Result<OrderTable> {
    let path = path.as_ref();
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;
    let table = from_bytes(&bytes)?;
    info!("loaded {} rows from {}", table.len(), path.display());
    Ok(table)
}

/// Detect the file type from its extension and load it.
///
/// Only `.csv` is accepted; the check is case-insensitive.
pub fn load_table(path: impl AsRef<Path>) -> Result<OrderTable> {
    let path = path.as_ref();
    match extension_of(path).as_deref() {
        Some("csv") => from_path(path),
        Some(ext) => Err(DashboardError::UnsupportedFile(ext.to_string())),
        None => Err(DashboardError::UnsupportedFile(path.display().to_string())),
    }
}

/// Validate an uploaded file name the same way [`load_table`] validates paths.
pub fn check_upload_name(name: &str) -> Result<()> {
    match extension_of(Path::new(name)).as_deref() {
        Some("csv") => Ok(()),
        Some(ext) => Err(DashboardError::UnsupportedFile(ext.to_string())),
        None => Err(DashboardError::UnsupportedFile(name.to_string())),
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_quoted_fields_and_nulls() {
        let csv = "TrxID,Product Name,Total Payment\n\
                   T1,\"Shirt, blue\",\"Rp 10.000\"\n\
                   T2,,5000\n";
        let table = from_bytes(csv.as_bytes()).unwrap();

        assert_eq!(table.headers(), ["TrxID", "Product Name", "Total Payment"]);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.value(0, "Product Name"),
            Some(&Value::Text("Shirt, blue".to_string()))
        );
        assert_eq!(table.value(1, "Product Name"), Some(&Value::Null));
    }

    #[test]
    fn strips_byte_order_mark_and_pads_short_rows() {
        let csv = "\u{FEFF}TrxID,Qty\nT1\n";
        let table = from_bytes(csv.as_bytes()).unwrap();
        assert!(table.has_column("TrxID"));
        assert_eq!(table.value(0, "Qty"), Some(&Value::Null));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(from_bytes(b""), Err(DashboardError::Empty)));
        assert!(matches!(from_bytes(b"  \n"), Err(DashboardError::Empty)));
    }

    #[test]
    fn header_only_file_gives_empty_table() {
        let table = from_bytes(b"TrxID,Qty\n").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.headers().len(), 2);
    }

    #[test]
    fn load_table_checks_extension() {
        let mut file = tempfile::Builder::new().suffix(".CSV").tempfile().unwrap();
        writeln!(file, "TrxID,Qty").unwrap();
        writeln!(file, "T1,2").unwrap();
        let table = load_table(file.path()).unwrap();
        assert_eq!(table.len(), 1);

        let other = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        assert!(matches!(
            load_table(other.path()),
            Err(DashboardError::UnsupportedFile(ext)) if ext == "xlsx"
        ));
    }

    #[test]
    fn upload_names_are_checked() {
        assert!(check_upload_name("orders.csv").is_ok());
        assert!(check_upload_name("orders.txt").is_err());
        assert!(check_upload_name("orders").is_err());
    }
}
