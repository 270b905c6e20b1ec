//! Excel読み書き
//!
//! 読み込みは calamine（xlsx/xls/ods の先頭シート）、書き出しは rust_xlsxwriter。

use super::TableRow;
use crate::error::{GrantScoutError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use grant_scout_common::Target;
use rust_xlsxwriter::{Format, Workbook};
use std::collections::HashMap;
use std::path::Path;

/// Excelのセル文字数上限
const MAX_CELL_CHARS: usize = 32_767;

fn cell_text(row: &[Data], index: Option<usize>) -> String {
    index
        .and_then(|i| row.get(i))
        .map(|cell| cell.to_string().trim().to_string())
        .unwrap_or_default()
}

/// 先頭シートから照合対象を読み込む（1行目がヘッダー）
pub fn read_targets(path: &Path) -> Result<Vec<Target>> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| GrantScoutError::ExcelRead(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| GrantScoutError::ExcelRead(format!("シートがありません: {}", path.display())))?
        .map_err(|e| GrantScoutError::ExcelRead(e.to_string()))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };

    let columns: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| (cell.to_string().trim().to_string(), i))
        .collect();
    let column = |name: &str| columns.get(name).copied();
    let (pi_col, title_col, fy_col, activity_col) =
        (column("PI_NAMEs"), column("PROJECT_TITLE"), column("FY"), column("ACTIVITY"));

    let targets = rows
        .filter(|row| row.iter().any(|cell| !cell.to_string().trim().is_empty()))
        .map(|row| Target {
            pi_names: cell_text(row, pi_col),
            title: cell_text(row, title_col),
            fiscal_year: cell_text(row, fy_col),
            activity: cell_text(row, activity_col),
        })
        .collect();

    Ok(targets)
}

/// ヘッダー付きの1シートをバッファに生成
pub fn rows_to_buffer<R: TableRow>(rows: &[R], sheet_name: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col, header) in R::headers().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let excel_row = (i + 1) as u32;
        for (col, value) in row.values().into_iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let value: String = value.chars().take(MAX_CELL_CHARS).collect();
            worksheet.write_string(excel_row, col as u16, value)?;
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    Ok(workbook.save_to_buffer()?)
}
