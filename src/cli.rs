use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "grant-scout")]
#[command(about = "NIH RePORTER 助成金検索・抄録照合ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 進捗表示を抑制
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 照合対象ごとにプロジェクトを検索して抄録を取得
    Abstracts {
        /// 照合対象ファイル（CSV/Excel）
        #[arg(short, long, default_value = "targets.csv")]
        input: PathBuf,

        /// 出力ファイル
        #[arg(short, long, default_value = "project_abstracts.csv")]
        output: PathBuf,

        /// 出力形式 (csv/excel/both)
        #[arg(short, long, default_value = "csv")]
        format: ExportFormat,

        /// 採用の閾値（0.0-1.0、この値を超えたら一致）
        #[arg(long)]
        threshold: Option<f64>,

        /// タイトル類似度の重み
        #[arg(long)]
        title_weight: Option<f64>,

        /// PI名一致の重み
        #[arg(long)]
        name_weight: Option<f64>,

        /// リクエスト間隔（ミリ秒）
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// 機関の採用関連グラントを一括取得
    Grants {
        /// 出力ファイル
        #[arg(short, long, default_value = "mayo_grants.csv")]
        output: PathBuf,

        /// 出力形式 (csv/excel/both)
        #[arg(short, long, default_value = "csv")]
        format: ExportFormat,

        /// 残り期間の下限（年）
        #[arg(long)]
        min_years_remaining: Option<f64>,

        /// タイトル単位の重複除去を無効化
        #[arg(long)]
        no_dedupe: bool,

        /// READMEの集計更新を無効化
        #[arg(long)]
        no_readme: bool,

        /// 子プロジェクトも含める
        #[arg(long)]
        include_subprojects: bool,

        /// 集計を書き込むREADME
        #[arg(long)]
        readme: Option<PathBuf>,

        /// リクエスト間隔（ミリ秒）
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// 設定を表示/初期化
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 既定値で設定ファイルを作り直す
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Excel,
    Both,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "both" => Ok(ExportFormat::Both),
            _ => Err(format!("Unknown format: {}. Use csv, excel, or both", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Excel => write!(f, "excel"),
            ExportFormat::Both => write!(f, "both"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_from_str() {
        assert_eq!("CSV".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert_eq!("xlsx".parse::<ExportFormat>(), Ok(ExportFormat::Excel));
        assert_eq!("both".parse::<ExportFormat>(), Ok(ExportFormat::Both));
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_parse_grants_flags() {
        let cli = Cli::parse_from([
            "grant-scout",
            "grants",
            "--no-dedupe",
            "--min-years-remaining",
            "2.0",
            "-f",
            "both",
        ]);
        match cli.command {
            Commands::Grants {
                no_dedupe,
                min_years_remaining,
                format,
                output,
                ..
            } => {
                assert!(no_dedupe);
                assert_eq!(min_years_remaining, Some(2.0));
                assert_eq!(format, ExportFormat::Both);
                assert_eq!(output, PathBuf::from("mayo_grants.csv"));
            }
            _ => panic!("grants subcommand expected"),
        }
    }
}
