use serde::Deserialize;

/// A single worksheet held in memory: an ordered header row plus data rows.
/// Cells are `None` when the source cell was empty, mirroring the missing
/// values spreadsheets are full of.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl SheetTable {
    /// Creates an empty table with the provided sheet name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Position of a column by header name, if present.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == header)
    }

    /// Appends the column if no header with that name exists yet, padding
    /// every existing row with an empty cell. Returns the column's position.
    pub fn ensure_column(&mut self, header: &str) -> usize {
        if let Some(index) = self.column_index(header) {
            return index;
        }
        self.columns.push(header.to_string());
        for row in &mut self.rows {
            row.push(None);
        }
        self.columns.len() - 1
    }

    /// Writes a cell, padding the row if it is shorter than the header row.
    pub fn set_cell(&mut self, row: usize, column: usize, value: Option<String>) {
        if let Some(cells) = self.rows.get_mut(row) {
            if cells.len() <= column {
                cells.resize(column + 1, None);
            }
            cells[column] = value;
        }
    }

    /// Reads a cell; `None` for missing rows, short rows, and empty cells.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)?
            .get(column)?
            .as_deref()
            .filter(|value| !value.is_empty())
    }
}

/// Envelope returned by `GET /api/v0/devices/<hostname>`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub devices: Vec<DeviceInfo>,
}

/// Live attributes reported by the monitoring API for one device. Every field
/// is optional; absent fields annotate as empty cells.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceInfo {
    pub hostname: Option<String>,
    pub ip: Option<String>,
    #[serde(rename = "sysDescr")]
    pub sys_descr: Option<String>,
    pub hardware: Option<String>,
    pub os: Option<String>,
    pub version: Option<String>,
    pub last_polled: Option<String>,
    pub location: Option<String>,
}

/// Annotation columns appended to every device sheet, in output order.
pub const ANNOTATION_COLUMNS: [&str; 13] = [
    "hostname",
    "ip",
    "sysDescr",
    "hardware",
    "os",
    "version",
    "last_polled",
    "location",
    "Expected_Location",
    "Compliant",
    "Status",
    "DNS_IP",
    "DNS_Status",
];

/// Status cell values for the primary lookup.
pub const STATUS_FOUND: &str = "Found";
pub const STATUS_NOT_FOUND: &str = "Not found in LibreNMS";

/// Name of the generated aggregate sheet.
pub const SUMMARY_SHEET: &str = "Summary";

/// Per-sheet aggregate derived from the written Status/Compliant columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetSummary {
    pub sheet_name: String,
    pub total_devices: u64,
    pub found: u64,
    pub not_found: u64,
    pub compliant: u64,
    pub non_compliant: u64,
}

impl SheetSummary {
    /// Column-wise sum of all numeric fields across summaries.
    pub fn totals(summaries: &[SheetSummary]) -> SheetSummary {
        let mut totals = SheetSummary {
            sheet_name: "TOTAL".to_string(),
            ..SheetSummary::default()
        };
        for summary in summaries {
            totals.total_devices += summary.total_devices;
            totals.found += summary.found;
            totals.not_found += summary.not_found;
            totals.compliant += summary.compliant;
            totals.non_compliant += summary.non_compliant;
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_column_pads_existing_rows() {
        let mut table = SheetTable::new("Sheet1");
        table.columns = vec!["Device Name".to_string()];
        table.rows = vec![vec![Some("sw01".to_string())]];

        let index = table.ensure_column("Status");
        assert_eq!(index, 1);
        assert_eq!(table.rows[0].len(), 2);
        assert_eq!(table.cell(0, 1), None);

        // Idempotent on an existing header.
        assert_eq!(table.ensure_column("Status"), 1);
        assert_eq!(table.columns.len(), 2);
    }

    #[test]
    fn cell_treats_empty_string_as_missing() {
        let mut table = SheetTable::new("Sheet1");
        table.columns = vec!["A".to_string()];
        table.rows = vec![vec![Some(String::new())]];
        assert_eq!(table.cell(0, 0), None);
    }

    #[test]
    fn totals_row_sums_all_numeric_columns() {
        let summaries = vec![
            SheetSummary {
                sheet_name: "One".to_string(),
                total_devices: 3,
                found: 2,
                not_found: 1,
                compliant: 1,
                non_compliant: 1,
            },
            SheetSummary {
                sheet_name: "Two".to_string(),
                total_devices: 5,
                found: 4,
                not_found: 1,
                compliant: 3,
                non_compliant: 1,
            },
        ];

        let totals = SheetSummary::totals(&summaries);
        assert_eq!(totals.sheet_name, "TOTAL");
        assert_eq!(totals.total_devices, 8);
        assert_eq!(totals.found, 6);
        assert_eq!(totals.not_found, 2);
        assert_eq!(totals.compliant, 4);
        assert_eq!(totals.non_compliant, 2);
    }
}
