/*!
# Sales Dashboard

A browser-based dashboard for sales/order exports, built in Rust.

## Overview

The application ingests one CSV file of orders (uploaded through the browser or
read from a fixed path), cleans it, and shows descriptive aggregates of the rows
that survive the user's filters: headline totals, the monthly payment trend, the
payment status split, best-selling products and partner performance. The
filtered rows can be downloaded again as CSV or XLSX.

## Architecture

Every request runs the whole pipeline from the cleaned table:

### Data Layer
- **loader**: CSV bytes or file into an [`OrderTable`] of text cells
- **cleaning**: date and amount coercion (invalid values become null) and the derived `Month` column
- **filter**: date range and categorical selections applied one after another

### Aggregation Layer
- **aggregate**: summary totals, monthly trend, value counts, group totals and top-N rankings
- **dashboard**: one [`DashboardReport`] per request with every section that the columns allow
- **export**: filtered rows back to CSV (and XLSX with the `web` feature)

### Web Layer (`web` feature)
- **graph**: SVG line, bar and pie charts drawn with plotters
- **render**: handlebars pages for upload, dashboard and errors
- **app**: axum routes and the in-memory dataset store

## Design Highlights

- Missing columns hide their section instead of failing the page
- Unparseable dates and amounts become nulls, never errors
- The exported CSV loads back into an equivalent table
- Uploaded datasets live only in memory, oldest evicted first

## REST API Endpoints

- `GET /` - Upload page (redirects to the local dataset when `--data` is given)
- `POST /upload` - Multipart CSV upload, redirects to the new dashboard
- `GET /dashboard/{id}` - Dashboard for the filters in the query string
- `GET /dashboard/{id}/export.csv` - Filtered rows as CSV
- `GET /dashboard/{id}/export.xlsx` - Filtered rows as XLSX
- `GET /health` - Liveness probe
*/

pub mod aggregate;
pub mod cleaning;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod table;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod graph;
#[cfg(feature = "web")]
pub mod render;

pub use aggregate::{Bucket, GroupRow, Summary};
pub use config::Config;
pub use dashboard::{DashboardReport, ReportOptions, build_report};
pub use error::{DashboardError, Result};
pub use filter::{FilterOptions, FilterPanel};
pub use table::{OrderTable, Value};
