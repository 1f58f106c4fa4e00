use crate::aggregate;
use crate::format::format_timestamp_ms;
use crate::types::HistoryEntry;
use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet, XlsxError};

const SHEET_NAME: &str = "History";

/// Fixed column order for the history report.
pub const EXPORT_HEADERS: &[&str] = &[
    "Tanggal",
    "Nama File",
    "Nama Item",
    "Jumlah",
    "Harga Satuan",
    "Total Harga",
    "Subtotal",
    "Total Discount",
    "Final Total",
];

// Harga Satuan, Total Harga, Subtotal, Total Discount, Final Total.
const AMOUNT_COLUMN_INDICES: [usize; 5] = [4, 5, 6, 7, 8];
const AMOUNT_COLUMN_WIDTH: f64 = 14.0;

/// One export row: a single line item enriched with its entry's metadata
/// and aggregates. The aggregates repeat identically on every row belonging
/// to the same entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub timestamp: String,
    pub file_name: String,
    pub product_name: Option<String>,
    pub quantity: Option<f64>,
    pub price_per_item: Option<f64>,
    pub total_price: Option<f64>,
    pub subtotal: f64,
    pub total_discount: f64,
    pub final_total: f64,
}

/// Flatten history entries to one row per (entry, line item). Entries with
/// no recognized items (failed attempts included) contribute no rows.
pub fn export_rows(entries: &[HistoryEntry]) -> Vec<ExportRow> {
    let mut rows = Vec::new();
    for entry in entries {
        let data = match &entry.data {
            Some(data) => data,
            None => continue,
        };
        let subtotal = aggregate::subtotal(data);
        let total_discount = aggregate::total_discount(data);
        let final_total = aggregate::final_total(data);
        for item in &data.product_item {
            rows.push(ExportRow {
                timestamp: format_timestamp_ms(entry.timestamp),
                file_name: entry.file_name.clone(),
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                price_per_item: item.price_per_item,
                total_price: item.total_price,
                subtotal,
                total_discount,
                final_total,
            });
        }
    }
    rows
}

/// Drop control characters that would corrupt the sheet XML.
fn sanitize_cell(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            let u = c as u32;
            c == '\t' || c == '\n' || c == '\r' || (u >= 0x20 && u != 0x7F && u != 0xFFFE && u != 0xFFFF)
        })
        .collect()
}

fn write_text_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    text: &str,
) -> Result<(), XlsxError> {
    worksheet.write_string(row, col, sanitize_cell(text)).map(|_| ())
}

/// Estimate column width from text length (char count x 1.2, clamped 10-50).
fn estimate_text_width(text: &str) -> f64 {
    let w = text.chars().count() as f64 * 1.2;
    w.clamp(10.0, 50.0)
}

/// Per-column widths: max of header and cell content; amount columns fixed.
fn calculate_column_widths(rows: &[ExportRow]) -> Vec<f64> {
    let mut max_widths: Vec<f64> = EXPORT_HEADERS.iter().map(|h| estimate_text_width(h)).collect();
    for row in rows {
        let text_cells = [
            (0usize, row.timestamp.as_str()),
            (1, row.file_name.as_str()),
            (2, row.product_name.as_deref().unwrap_or("")),
        ];
        for (col_idx, value) in text_cells {
            let w = estimate_text_width(value);
            if w > max_widths[col_idx] {
                max_widths[col_idx] = w.min(50.0);
            }
        }
    }
    for &idx in &AMOUNT_COLUMN_INDICES {
        max_widths[idx] = AMOUNT_COLUMN_WIDTH;
    }
    max_widths
}

/// Serialize the full history to a single-sheet workbook in memory. The
/// buffer is ready for the host to offer as a file download.
pub fn export_history(entries: &[HistoryEntry]) -> Result<Vec<u8>, String> {
    let rows = export_rows(entries);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME).map_err(|e: XlsxError| e.to_string())?;

    let header_format = Format::new()
        .set_bold()
        .set_background_color(rust_xlsxwriter::Color::RGB(0x2563EB))
        .set_font_color(rust_xlsxwriter::Color::RGB(0xFFFFFF));
    let money_format = Format::new()
        .set_num_format("#,##0.00")
        .set_align(FormatAlign::Right);

    for (col, &w) in calculate_column_widths(&rows).iter().enumerate() {
        worksheet
            .set_column_width(col as u16, w)
            .map_err(|e: XlsxError| e.to_string())?;
    }

    for (col, header) in EXPORT_HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(|e: XlsxError| e.to_string())?;
    }

    for (row_idx, row) in rows.iter().enumerate() {
        let r = (row_idx + 1) as u32;
        write_text_cell(worksheet, r, 0, &row.timestamp).map_err(|e| e.to_string())?;
        write_text_cell(worksheet, r, 1, &row.file_name).map_err(|e| e.to_string())?;
        if let Some(name) = &row.product_name {
            write_text_cell(worksheet, r, 2, name).map_err(|e| e.to_string())?;
        }
        if let Some(quantity) = row.quantity {
            worksheet
                .write_number(r, 3, quantity)
                .map_err(|e: XlsxError| e.to_string())?;
        }
        for (col, value) in [(4u16, row.price_per_item), (5, row.total_price)] {
            if let Some(value) = value {
                worksheet
                    .write_number_with_format(r, col, value, &money_format)
                    .map_err(|e: XlsxError| e.to_string())?;
            }
        }
        for (col, value) in [
            (6u16, row.subtotal),
            (7, row.total_discount),
            (8, row.final_total),
        ] {
            worksheet
                .write_number_with_format(r, col, value, &money_format)
                .map_err(|e: XlsxError| e.to_string())?;
        }
    }

    let _ = worksheet.set_freeze_panes(1, 0);
    workbook.save_to_buffer().map_err(|e: XlsxError| e.to_string())
}

/// Write the report to the given path, or to Downloads (Desktop fallback)
/// under a date-stamped name. Returns the saved file path.
pub fn export_history_to_file(
    entries: &[HistoryEntry],
    path_override: Option<&str>,
) -> Result<String, String> {
    let path = if let Some(p) = path_override.filter(|s| !s.trim().is_empty()) {
        let mut pb = std::path::PathBuf::from(p.trim());
        if pb.extension().map(|e| e.to_str()) != Some(Some("xlsx")) {
            pb.set_extension("xlsx");
        }
        pb
    } else {
        let dir = dirs::download_dir()
            .or_else(dirs::desktop_dir)
            .ok_or("Could not find Downloads or Desktop folder.")?;
        let today = chrono::Local::now().format("%Y-%m-%d");
        let mut p = dir.join(format!("receipt-history-{}.xlsx", today));
        let mut counter = 2u32;
        while p.exists() {
            p = dir.join(format!("receipt-history-{}_{}.xlsx", today, counter));
            counter += 1;
        }
        p
    };

    let path_str = path.to_str().ok_or("Invalid path characters.")?.to_string();
    let buffer = export_history(entries)?;
    std::fs::write(&path, buffer).map_err(|e| format!("Cannot write to file: {}", e))?;
    Ok(path_str)
}
