//! Spreadsheet reports
//!
//! Renders the registry as an XLSX workbook, entirely in memory: one row per
//! device, bold headers, every column sized to its longest cell. The caller
//! sends the bytes straight to Telegram as a document.

use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::registry::{display_offset, DeviceRecord};

/// Column headers, in sheet order.
const HEADERS: [&str; 5] = [
    "Serial number",
    "Model",
    "Metrological firmware",
    "Non-metrological firmware",
    "Captured at",
];

/// Extra width beyond the longest cell, in characters.
const COLUMN_PADDING: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to build workbook: {0}")]
    Xlsx(#[from] XlsxError),
}

/// A generated report, ready to send as a document.
pub struct Report {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Build the device report workbook.
///
/// `generated_at` only drives the filename; record timestamps were fixed at
/// capture time and are copied through verbatim.
pub fn build_report(
    devices: &[(String, DeviceRecord)],
    generated_at: DateTime<Utc>,
) -> Result<Report, ReportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Devices")?;

    let header_format = Format::new().set_bold();
    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (row, (serial, record)) in devices.iter().enumerate() {
        let row = row as u32 + 1;
        worksheet.write_string(row, 0, serial)?;
        worksheet.write_string(row, 1, record.model.to_string())?;
        worksheet.write_string(row, 2, &record.metrological)?;
        worksheet.write_string(row, 3, &record.non_metrological)?;
        worksheet.write_string(row, 4, &record.captured_at)?;
    }

    for (col, width) in column_widths(devices).into_iter().enumerate() {
        worksheet.set_column_width(col as u16, width as f64)?;
    }

    let bytes = workbook.save_to_buffer()?;
    let stamp = generated_at
        .with_timezone(&display_offset())
        .format("%Y%m%d_%H%M");
    Ok(Report {
        filename: format!("devices_{stamp}.xlsx"),
        bytes,
    })
}

/// Per-column width: the longest cell or header, plus fixed padding.
fn column_widths(devices: &[(String, DeviceRecord)]) -> [usize; 5] {
    let mut widths = HEADERS.map(str::len);
    for (serial, record) in devices {
        let cells = [
            serial.chars().count(),
            record.model.as_str().len(),
            record.metrological.chars().count(),
            record.non_metrological.chars().count(),
            record.captured_at.chars().count(),
        ];
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell);
        }
    }
    widths.map(|w| w + COLUMN_PADDING)
}
