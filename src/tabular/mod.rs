//! 表形式ファイルの入出力
//!
//! - 入力: CSV または Excel（xlsx/xls/ods）の照合対象
//! - 出力: CSV / Excel / 両方。一時ファイルに書いてから rename するので途中状態のファイルは残らない

pub mod csv_io;
pub mod excel;

use crate::cli::ExportFormat;
use crate::error::{GrantScoutError, Result};
use grant_scout_common::{AbstractRow, GrantRow, Target};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// ヘッダー付きで書き出せる行
pub trait TableRow {
    fn headers() -> &'static [&'static str];
    fn values(&self) -> Vec<String>;
}

impl TableRow for AbstractRow {
    fn headers() -> &'static [&'static str] {
        &AbstractRow::HEADERS
    }

    fn values(&self) -> Vec<String> {
        AbstractRow::values(self)
    }
}

impl TableRow for GrantRow {
    fn headers() -> &'static [&'static str] {
        &GrantRow::HEADERS
    }

    fn values(&self) -> Vec<String> {
        GrantRow::values(self)
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// 照合対象を読み込む（拡張子で形式を判定）
pub fn read_targets(path: &Path) -> Result<Vec<Target>> {
    if !path.exists() {
        return Err(GrantScoutError::FileNotFound(path.display().to_string()));
    }

    match extension_of(path).as_str() {
        "csv" => {
            let file = File::open(path)?;
            csv_io::read_targets(BufReader::new(file))
        }
        "xlsx" | "xls" | "xlsm" | "ods" => excel::read_targets(path),
        other => Err(GrantScoutError::UnsupportedTable(format!(
            "{} (.{})",
            path.display(),
            other
        ))),
    }
}

/// 同じディレクトリの一時ファイルに書いてから置き換える
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    write(temp.as_file_mut())?;
    temp.as_file_mut().flush()?;
    temp.persist(path).map_err(|e| GrantScoutError::Io(e.error))?;
    Ok(())
}

/// CSVファイルに書き出す
pub fn write_csv<R: TableRow>(path: &Path, rows: &[R]) -> Result<()> {
    write_atomically(path, |file| csv_io::write_rows(file, rows))
}

/// 出力形式ごとの書き出し先（拡張子は形式に合わせて差し替える）
pub fn output_paths(output: &Path, format: &ExportFormat) -> Vec<PathBuf> {
    match format {
        ExportFormat::Csv => vec![output.with_extension("csv")],
        ExportFormat::Excel => vec![output.with_extension("xlsx")],
        ExportFormat::Both => vec![output.with_extension("csv"), output.with_extension("xlsx")],
    }
}

/// 指定形式で書き出し、書いたパスを返す
///
/// Excelはファイルを書く前にバッファを生成する（生成失敗時は何も書かない）。
pub fn write_table<R: TableRow>(
    rows: &[R],
    format: &ExportFormat,
    output: &Path,
    sheet_name: &str,
) -> Result<Vec<PathBuf>> {
    let paths = output_paths(output, format);
    let excel_buffer = match format {
        ExportFormat::Excel | ExportFormat::Both => Some(excel::rows_to_buffer(rows, sheet_name)?),
        ExportFormat::Csv => None,
    };

    for path in &paths {
        match (&excel_buffer, extension_of(path) == "xlsx") {
            (Some(buffer), true) => write_atomically(path, |file| {
                file.write_all(buffer)?;
                Ok(())
            })?,
            _ => write_csv(path, rows)?,
        }
    }
    Ok(paths)
}
