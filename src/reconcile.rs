use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{info, instrument, warn};

use crate::client::DeviceLookup;
use crate::compliance::is_location_compliant;
use crate::dns::Resolver;
use crate::error::{Result, ToolError};
use crate::io::{excel_read, excel_write};
use crate::model::{
    ANNOTATION_COLUMNS, STATUS_FOUND, STATUS_NOT_FOUND, SUMMARY_SHEET, SheetSummary, SheetTable,
};
use crate::template;

/// Settings for one reconciliation run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Workbook that is annotated in place.
    pub workbook: PathBuf,
    /// Expected-location template; `None` disables the compliance check.
    pub location_format: Option<String>,
    /// Suffix appended to bare device names to form the lookup key.
    pub domain_suffix: String,
    /// Zero-based index of the column holding device names.
    pub device_column: usize,
}

/// Running counters for one sheet, kept for operator logging. The Summary
/// sheet is recomputed from the written file, never from these.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SheetCounters {
    pub processed: u64,
    pub found: u64,
    pub not_found: u64,
    pub compliant: u64,
    pub non_compliant: u64,
}

/// Reconciles the workbook against the monitoring system: annotates every
/// device row, appends a Summary sheet, and replaces the file atomically. A
/// `.bak` copy of the original is written before anything else.
#[instrument(level = "info", skip_all, fields(workbook = %config.workbook.display()))]
pub fn run<L: DeviceLookup, R: Resolver>(config: &RunConfig, lookup: &L, resolver: &R) -> Result<()> {
    if !config.workbook.exists() {
        return Err(ToolError::MissingInput(config.workbook.clone()));
    }

    let mut tables = excel_read::read_tables(&config.workbook)?;
    if tables.is_empty() {
        return Err(ToolError::EmptyWorkbook(config.workbook.clone()));
    }
    let sheet_names: Vec<&str> = tables.iter().map(|table| table.name.as_str()).collect();
    info!(sheet_count = tables.len(), sheets = ?sheet_names, "workbook loaded");

    let backup = sibling_path(&config.workbook, "bak");
    fs::copy(&config.workbook, &backup)?;
    info!(backup = %backup.display(), "backup created");

    let total_sheets = tables.len();
    for (index, table) in tables.iter_mut().enumerate() {
        if table.columns.is_empty() || table.rows.is_empty() {
            warn!(sheet = %table.name, "sheet is empty, skipping");
            continue;
        }
        info!(
            sheet = %table.name,
            position = index + 1,
            total = total_sheets,
            "processing sheet"
        );
        annotate_sheet(table, config, lookup, resolver);
    }

    // Stage the annotated sheets, then derive the summary by re-reading what
    // was actually written so the Summary sheet cannot drift from disk state.
    let staging = sibling_path(&config.workbook, "tmp");
    excel_write::write_tables(&staging, &tables)?;

    let written = excel_read::read_tables(&staging)?;
    let summaries: Vec<SheetSummary> = written
        .iter()
        .filter(|table| !table.columns.is_empty() && !table.rows.is_empty())
        .map(summarize_sheet)
        .collect();

    tables.push(build_summary_table(&summaries));
    excel_write::write_tables(&staging, &tables)?;
    fs::rename(&staging, &config.workbook)?;

    info!(output = %config.workbook.display(), "all sheets processed and saved");
    Ok(())
}

/// Annotates every device row of one sheet in place and returns the running
/// counters for operator logging.
pub fn annotate_sheet<L: DeviceLookup, R: Resolver>(
    table: &mut SheetTable,
    config: &RunConfig,
    lookup: &L,
    resolver: &R,
) -> SheetCounters {
    let device_column = if config.device_column < table.columns.len() {
        config.device_column
    } else {
        warn!(
            sheet = %table.name,
            index = config.device_column,
            "device column index out of range, using first column"
        );
        0
    };
    info!(sheet = %table.name, column = %table.columns[device_column], "device name column");

    let [
        hostname_col,
        ip_col,
        sys_descr_col,
        hardware_col,
        os_col,
        version_col,
        last_polled_col,
        location_col,
        expected_col,
        compliant_col,
        status_col,
        dns_ip_col,
        dns_status_col,
    ] = ANNOTATION_COLUMNS.map(|header| table.ensure_column(header));

    let total_rows = table.rows.len();
    let mut counters = SheetCounters::default();

    for row_idx in 0..total_rows {
        let device_name = match table.cell(row_idx, device_column) {
            Some(value) if !value.trim().is_empty() => value.trim().to_string(),
            _ => continue,
        };

        counters.processed += 1;
        if counters.processed % 5 == 0 || counters.processed == total_rows as u64 {
            info!(
                sheet = %table.name,
                processed = counters.processed,
                total = total_rows,
                "progress"
            );
        }

        let full_hostname = qualify_hostname(&device_name, &config.domain_suffix);

        let expected = config
            .location_format
            .as_deref()
            .and_then(|format| template::expand(format, &table.columns, &table.rows[row_idx]))
            .filter(|value| !value.is_empty());
        if config.location_format.is_some() {
            table.set_cell(row_idx, expected_col, expected.clone());
        }

        info!(hostname = %full_hostname, "querying API for device");
        match lookup.lookup(&full_hostname) {
            Some(device) => {
                counters.found += 1;
                table.set_cell(row_idx, hostname_col, device.hostname.clone());
                table.set_cell(row_idx, ip_col, device.ip.clone());
                table.set_cell(row_idx, sys_descr_col, device.sys_descr.clone());
                table.set_cell(row_idx, hardware_col, device.hardware.clone());
                table.set_cell(row_idx, os_col, device.os.clone());
                table.set_cell(row_idx, version_col, device.version.clone());
                table.set_cell(row_idx, last_polled_col, device.last_polled.clone());
                table.set_cell(row_idx, location_col, device.location.clone());

                let location = device.location.unwrap_or_default();
                let compliant = expected
                    .as_deref()
                    .map(|expected| is_location_compliant(&location, expected));
                match compliant {
                    Some(true) => counters.compliant += 1,
                    Some(false) => counters.non_compliant += 1,
                    None => {}
                }
                let verdict = if compliant == Some(true) { "Yes" } else { "No" };
                table.set_cell(row_idx, compliant_col, Some(verdict.to_string()));
                table.set_cell(row_idx, status_col, Some(STATUS_FOUND.to_string()));
                info!(
                    hostname = %full_hostname,
                    location = %location,
                    expected = expected.as_deref().unwrap_or(""),
                    compliant = verdict,
                    "device found"
                );
            }
            None => {
                counters.not_found += 1;
                table.set_cell(row_idx, status_col, Some(STATUS_NOT_FOUND.to_string()));
                info!(hostname = %full_hostname, "device not found, attempting DNS lookup");
                let (address, status) = resolver.resolve(&full_hostname);
                table.set_cell(row_idx, dns_ip_col, address.map(|address| address.to_string()));
                table.set_cell(row_idx, dns_status_col, Some(status.as_str().to_string()));
                info!(status = %status, address = ?address, "DNS lookup result");
            }
        }
    }

    info!(
        sheet = %table.name,
        processed = counters.processed,
        found = counters.found,
        not_found = counters.not_found,
        compliant = counters.compliant,
        non_compliant = counters.non_compliant,
        "sheet summary"
    );
    counters
}

/// Derives the lookup key for a device name. Names that already split into
/// two or more non-empty dot-separated parts are taken as fully qualified;
/// anything else gets the configured suffix appended.
pub fn qualify_hostname(name: &str, suffix: &str) -> String {
    if name.contains('.') {
        let parts = name.split('.').filter(|part| !part.is_empty()).count();
        if parts >= 2 {
            return name.to_string();
        }
    }
    format!("{name}{suffix}")
}

/// Recomputes one sheet's aggregate from its written Status and Compliant
/// columns.
pub fn summarize_sheet(table: &SheetTable) -> SheetSummary {
    let status_col = table.column_index("Status");
    let compliant_col = table.column_index("Compliant");

    let mut summary = SheetSummary {
        sheet_name: table.name.clone(),
        total_devices: table.rows.len() as u64,
        ..SheetSummary::default()
    };

    for row_idx in 0..table.rows.len() {
        if let Some(column) = status_col {
            match table.cell(row_idx, column) {
                Some(STATUS_FOUND) => summary.found += 1,
                Some(STATUS_NOT_FOUND) => summary.not_found += 1,
                _ => {}
            }
        }
        if let Some(column) = compliant_col {
            match table.cell(row_idx, column) {
                Some("Yes") => summary.compliant += 1,
                Some("No") => summary.non_compliant += 1,
                _ => {}
            }
        }
    }

    summary
}

/// Builds the Summary sheet: one row per processed sheet plus a TOTAL row.
pub fn build_summary_table(summaries: &[SheetSummary]) -> SheetTable {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let totals = SheetSummary::totals(summaries);

    let mut table = SheetTable::new(SUMMARY_SHEET);
    table.columns = [
        "Sheet Name",
        "Total Devices",
        "Devices Found",
        "Devices Not Found",
        "Compliant Locations",
        "Non-Compliant Locations",
        "Processed Date",
    ]
    .map(String::from)
    .to_vec();

    for summary in summaries.iter().chain(std::iter::once(&totals)) {
        table.rows.push(vec![
            Some(summary.sheet_name.clone()),
            Some(summary.total_devices.to_string()),
            Some(summary.found.to_string()),
            Some(summary.not_found.to_string()),
            Some(summary.compliant.to_string()),
            Some(summary.non_compliant.to_string()),
            Some(timestamp.clone()),
        ]);
    }

    table
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
