use thiserror::Error;

#[derive(Error, Debug)]
pub enum GrantScoutError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("HTTPエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSVエラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(#[from] rust_xlsxwriter::XlsxError),

    #[error("Excel読み込みエラー: {0}")]
    ExcelRead(String),

    #[error("未対応の表形式: {0}")]
    UnsupportedTable(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] grant_scout_common::Error),
}

pub type Result<T> = std::result::Result<T, GrantScoutError>;
