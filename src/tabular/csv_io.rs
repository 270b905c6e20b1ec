//! CSV読み書き

use super::TableRow;
use crate::error::Result;
use grant_scout_common::Target;
use serde::Deserialize;
use std::io::{Read, Write};

/// 入力CSVの1行（列が無い場合は空文字）
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TargetRecord {
    #[serde(rename = "PI_NAMEs")]
    pi_names: String,
    #[serde(rename = "PROJECT_TITLE")]
    project_title: String,
    #[serde(rename = "FY")]
    fiscal_year: String,
    #[serde(rename = "ACTIVITY")]
    activity: String,
}

/// ヘッダー付きCSVから照合対象を読み込む
pub fn read_targets<R: Read>(reader: R) -> Result<Vec<Target>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut targets = Vec::new();
    for record in csv_reader.deserialize::<TargetRecord>() {
        let record = record?;
        targets.push(Target {
            pi_names: record.pi_names,
            title: record.project_title,
            fiscal_year: record.fiscal_year,
            activity: record.activity,
        });
    }
    Ok(targets)
}

/// ヘッダー行 + 全行を書き出す（0行でもヘッダーは出力）
pub fn write_rows<W: Write, R: TableRow>(writer: W, rows: &[R]) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    csv_writer.write_record(R::headers())?;
    for row in rows {
        csv_writer.write_record(row.values())?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use grant_scout_common::GrantRow;

    #[test]
    fn test_read_targets_with_missing_columns() {
        let data = "PROJECT_TITLE,PI_NAMEs,EXTRA\n  Cancer Genomics , John Smith ,x\nHeart Study,,\n";
        let targets = read_targets(data.as_bytes()).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].title, "Cancer Genomics");
        assert_eq!(targets[0].pi_names, "John Smith");
        assert!(targets[0].fiscal_year.is_empty());
        assert!(targets[1].pi_names.is_empty());
    }

    #[test]
    fn test_write_rows_header_only() {
        let mut buffer = Vec::new();
        write_rows::<_, GrantRow>(&mut buffer, &[]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("PI_NAMEs,ORG_NAME,ORG_CITY"));
    }

    #[test]
    fn test_write_rows_quotes_fields() {
        let row = GrantRow {
            project_title: "Genes, Cells, and \"Models\"".into(),
            fiscal_year: "2024".into(),
            ..Default::default()
        };
        let mut buffer = Vec::new();
        write_rows(&mut buffer, &[row]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("\"Genes, Cells, and \"\"Models\"\"\""));
    }
}
