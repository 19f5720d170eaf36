use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::error::Result;
use crate::model::SheetTable;

/// Writes the provided tables to the given path, one worksheet per table.
/// Headers land in the first row; empty cells are left blank.
pub fn write_tables(path: &Path, tables: &[SheetTable]) -> Result<()> {
    let mut workbook = Workbook::new();

    for table in tables {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&table.name)?;

        for (col_idx, header) in table.columns.iter().enumerate() {
            worksheet.write_string(0, col_idx as u16, header)?;
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                if let Some(value) = cell {
                    worksheet.write_string((row_idx + 1) as u32, col_idx as u16, value)?;
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}
