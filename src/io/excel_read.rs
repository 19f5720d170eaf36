use std::path::Path;

use calamine::{DataType, Reader, open_workbook_auto};

use crate::error::Result;
use crate::model::SheetTable;

/// Reads every sheet of the workbook into memory. The first row of each sheet
/// is treated as the header row; all other rows become data rows with empty
/// cells represented as `None`. Sheets with no content at all come back with
/// empty columns and rows so the caller can decide how to handle them.
pub fn read_tables(path: &Path) -> Result<Vec<SheetTable>> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

    let mut tables = Vec::with_capacity(sheet_names.len());
    for name in sheet_names {
        let mut table = SheetTable::new(name.clone());
        if let Some(range_result) = workbook.worksheet_range(&name) {
            let range = range_result?;
            let mut rows = range.rows();
            if let Some(header_row) = rows.next() {
                table.columns = header_row
                    .iter()
                    .map(|cell| cell_to_string(Some(cell)))
                    .collect();
            }
            for row in rows {
                table.rows.push(row.iter().map(cell_to_value).collect());
            }
        }
        tables.push(table);
    }

    Ok(tables)
}

fn cell_to_value(cell: &DataType) -> Option<String> {
    let value = cell_to_string(Some(cell));
    if value.is_empty() { None } else { Some(value) }
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
