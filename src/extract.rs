//! Excerpt extraction: turn an uploaded document into the bounded text slice
//! sent to the model.
//!
//! Three strategies, selected by MIME type: spreadsheets are rendered as up to
//! [`MAX_SPREADSHEET_ROWS`] human-readable invoice lines, PDFs are cut to the
//! first [`MAX_PDF_CHARS`] characters of extracted text, and images pass
//! through a static placeholder (no visual content is inspected - a known
//! limitation carried over from the service this replaces).

use std::io::Cursor;

use bytes::Bytes;
use calamine::{Data, Range, Reader, Xlsx};

use crate::errors::{Error, Result};

/// MIME type declared by XLSX uploads
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Spreadsheet excerpts cover at most this many data rows
pub const MAX_SPREADSHEET_ROWS: usize = 20;

/// PDF excerpts are hard-cut to this many characters
pub const MAX_PDF_CHARS: usize = 1000;

/// Excerpt used for image uploads, which are never decoded
pub const IMAGE_PLACEHOLDER: &str = "Limited summary content due to file type restrictions.";

/// Extraction strategy for an upload, derived from its declared MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Spreadsheet,
    Pdf,
    Image,
}

impl DocumentKind {
    /// Map a declared MIME type onto an extraction strategy. Returns `None`
    /// for anything outside the allow-list.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            XLSX_MIME => Some(DocumentKind::Spreadsheet),
            "application/pdf" => Some(DocumentKind::Pdf),
            "image/png" | "image/jpeg" => Some(DocumentKind::Image),
            _ => None,
        }
    }
}

/// Extract the bounded text excerpt for an upload.
///
/// The spreadsheet and PDF parses are synchronous library calls, so they run
/// on the blocking pool.
pub async fn excerpt(kind: DocumentKind, data: Bytes) -> Result<String> {
    match kind {
        DocumentKind::Spreadsheet => run_blocking(move || spreadsheet_excerpt(&data)).await,
        DocumentKind::Pdf => run_blocking(move || pdf_excerpt(&data)).await,
        DocumentKind::Image => Ok(IMAGE_PLACEHOLDER.to_string()),
    }
}

async fn run_blocking<F>(parse: F) -> Result<String>
where
    F: FnOnce() -> Result<String> + Send + 'static,
{
    tokio::task::spawn_blocking(parse)
        .await
        .map_err(|e| Error::Other(anyhow::anyhow!("extraction task failed: {e}")))?
}

/// The four spreadsheet columns interpolated into each excerpt line.
const CUSTOMER_COLUMN: &str = "Party Name";
const PRODUCT_COLUMN: &str = "Product Name";
const QTY_COLUMN: &str = "Qty";
const TOTAL_COLUMN: &str = "Item Total Amount";

/// One data row of the first sheet, reduced to the tracked fields.
#[derive(Debug, Default, PartialEq)]
struct InvoiceRow {
    customer: Option<String>,
    product: Option<String>,
    qty: Option<String>,
    total: Option<String>,
}

fn spreadsheet_excerpt(data: &[u8]) -> Result<String> {
    let extraction_error = |message: String| Error::Extraction { kind: "spreadsheet", message };

    let mut workbook = Xlsx::new(Cursor::new(data.to_vec())).map_err(|e| extraction_error(e.to_string()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| extraction_error("workbook contains no sheets".to_string()))?;
    let range = workbook.worksheet_range(&sheet_name).map_err(|e| extraction_error(e.to_string()))?;

    Ok(render_rows(&invoice_rows(&range)))
}

/// Read the header row, locate the tracked columns, and collect data rows.
fn invoice_rows(range: &Range<Data>) -> Vec<InvoiceRow> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Vec::new();
    };

    let column = |name: &str| header.iter().position(|cell| cell_text(cell).as_deref() == Some(name));
    let customer = column(CUSTOMER_COLUMN);
    let product = column(PRODUCT_COLUMN);
    let qty = column(QTY_COLUMN);
    let total = column(TOTAL_COLUMN);

    let field = |row: &[Data], index: Option<usize>| index.and_then(|i| row.get(i)).and_then(cell_text);

    rows.map(|row| InvoiceRow {
        customer: field(row, customer),
        product: field(row, product),
        qty: field(row, qty),
        total: field(row, total),
    })
    .collect()
}

/// Render up to [`MAX_SPREADSHEET_ROWS`] rows as fixed-format invoice lines,
/// substituting "N/A" for missing fields.
fn render_rows(rows: &[InvoiceRow]) -> String {
    rows.iter()
        .take(MAX_SPREADSHEET_ROWS)
        .enumerate()
        .map(|(index, row)| {
            format!(
                "Invoice {} - Customer: {}, Product: {}, Qty: {}, Total: {}",
                index + 1,
                field_or_na(&row.customer),
                field_or_na(&row.product),
                field_or_na(&row.qty),
                field_or_na(&row.total),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn field_or_na(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("N/A")
}

/// Cell contents as text. Empty cells and blank strings count as missing.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.trim().is_empty() => None,
        Data::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn pdf_excerpt(data: &[u8]) -> Result<String> {
    let text = pdf_extract::extract_text_from_mem(data).map_err(|e| Error::Extraction {
        kind: "PDF",
        message: e.to_string(),
    })?;
    Ok(truncate_chars(&text, MAX_PDF_CHARS))
}

/// Hard character cut - not word- or line-aware, but never inside a code point.
fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
