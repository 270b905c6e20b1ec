//! 助成金データの型定義
//!
//! CLIとテストで共有される型:
//! - CandidateRecord: 検索APIから返される候補レコード
//! - Target: 入力表から読み込む照合対象
//! - MatchResult: 照合結果（最良候補 + スコア）
//! - AbstractRow / GrantRow: 出力表の1行

use serde::{Deserialize, Serialize};

/// 研究代表者（PI）名
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiName {
    pub first: String,
    pub last: String,
}

impl PiName {
    pub fn new(first: impl Into<String>, last: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            last: last.into(),
        }
    }

    /// "First Last" 形式。両方空なら None
    pub fn display_name(&self) -> Option<String> {
        let first = self.first.trim();
        let last = self.last.trim();
        if first.is_empty() && last.is_empty() {
            return None;
        }
        Some(format!("{} {}", first, last).trim().to_string())
    }
}

/// 検索APIから返される候補レコード
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateRecord {
    pub title: String,
    pub abstract_text: Option<String>,
    pub pi_names: Vec<PiName>,
    pub fiscal_year: Option<i32>,
    pub project_num: String,
    pub activity_code: String,
    pub org_name: String,

    /// 開始日・終了日（APIの生文字列。解析は filter 側で遅延実行）
    pub start_date: Option<String>,
    pub end_date: Option<String>,

    // 一括取得モードのみで使う項目
    pub org_city: String,
    pub org_state: String,
    pub public_health_relevance: String,
    pub spending_categories: Vec<String>,
    pub support_year: Option<i32>,
    pub award_amount: Option<f64>,
    pub application_type: String,
}

impl CandidateRecord {
    /// PI名を "; " 区切りで連結
    pub fn pi_names_text(&self) -> String {
        self.pi_names
            .iter()
            .filter_map(PiName::display_name)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// 筆頭PI名（表示用）
    pub fn primary_pi(&self) -> String {
        self.pi_names
            .iter()
            .find_map(PiName::display_name)
            .unwrap_or_default()
    }
}

/// 入力表の照合対象
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub title: String,
    /// セミコロン区切りのPI名
    pub pi_names: String,
    pub fiscal_year: String,
    pub activity: String,
}

impl Target {
    /// 年度が数値として解釈できる場合のみ返す
    pub fn numeric_fiscal_year(&self) -> Option<i32> {
        parse_fiscal_year(&self.fiscal_year)
    }
}

/// 照合結果
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub record: CandidateRecord,
    /// 総合スコア（0.0〜1.0）
    pub score: f64,
    /// 一致した検索戦略のラベル
    pub strategy: String,
}

/// 抄録取得の結果ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Success,
    NotFound,
}

impl std::fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStatus::Success => write!(f, "SUCCESS"),
            FetchStatus::NotFound => write!(f, "NOT_FOUND"),
        }
    }
}

/// 抄録照合モードの出力行
#[derive(Debug, Clone, PartialEq)]
pub struct AbstractRow {
    pub pi_names: String,
    pub project_title: String,
    pub fiscal_year: String,
    pub activity: String,
    pub project_num: String,
    pub org_name: String,
    pub abstract_text: String,
    pub fetch_status: FetchStatus,
}

impl AbstractRow {
    pub const HEADERS: [&'static str; 8] = [
        "PI_NAMEs",
        "PROJECT_TITLE",
        "FISCAL_YEAR",
        "ACTIVITY",
        "PROJECT_NUM",
        "ORG_NAME",
        "ABSTRACT",
        "FETCH_STATUS",
    ];

    /// 照合成功時の行（APIから取得した値で埋める）
    pub fn found(result: &MatchResult) -> Self {
        let record = &result.record;
        Self {
            pi_names: record.pi_names_text(),
            project_title: record.title.clone(),
            fiscal_year: record.fiscal_year.map(|fy| fy.to_string()).unwrap_or_default(),
            activity: record.activity_code.clone(),
            project_num: record.project_num.clone(),
            org_name: record.org_name.clone(),
            abstract_text: record.abstract_text.clone().unwrap_or_default(),
            fetch_status: FetchStatus::Success,
        }
    }

    /// 見つからなかった場合の行（入力値をそのまま残す）
    pub fn not_found(target: &Target) -> Self {
        Self {
            pi_names: target.pi_names.clone(),
            project_title: target.title.clone(),
            fiscal_year: target.fiscal_year.clone(),
            activity: target.activity.clone(),
            project_num: String::new(),
            org_name: String::new(),
            abstract_text: String::new(),
            fetch_status: FetchStatus::NotFound,
        }
    }

    pub fn values(&self) -> Vec<String> {
        vec![
            self.pi_names.clone(),
            self.project_title.clone(),
            self.fiscal_year.clone(),
            self.activity.clone(),
            self.project_num.clone(),
            self.org_name.clone(),
            self.abstract_text.clone(),
            self.fetch_status.to_string(),
        ]
    }
}

/// 一括取得モードの出力行
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrantRow {
    pub pi_names: String,
    pub org_name: String,
    pub org_city: String,
    pub org_state: String,
    pub project_title: String,
    pub phr: String,
    pub spending_categories: String,
    pub fiscal_year: String,
    pub support_year: String,
    pub project_start: String,
    pub project_end: String,
    pub total_cost: String,
    pub activity: String,
    pub application_type: String,
    pub full_project_num: String,
}

impl GrantRow {
    pub const HEADERS: [&'static str; 15] = [
        "PI_NAMEs",
        "ORG_NAME",
        "ORG_CITY",
        "ORG_STATE",
        "PROJECT_TITLE",
        "PHR",
        "NIH_SPENDING_CATS",
        "FY",
        "SUPPORT_YEAR",
        "PROJECT_START",
        "PROJECT_END",
        "TOTAL_COST",
        "ACTIVITY",
        "APPLICATION_TYPE",
        "FULL_PROJECT_NUM",
    ];

    pub fn values(&self) -> Vec<String> {
        vec![
            self.pi_names.clone(),
            self.org_name.clone(),
            self.org_city.clone(),
            self.org_state.clone(),
            self.project_title.clone(),
            self.phr.clone(),
            self.spending_categories.clone(),
            self.fiscal_year.clone(),
            self.support_year.clone(),
            self.project_start.clone(),
            self.project_end.clone(),
            self.total_cost.clone(),
            self.activity.clone(),
            self.application_type.clone(),
            self.full_project_num.clone(),
        ]
    }
}

impl From<&CandidateRecord> for GrantRow {
    fn from(record: &CandidateRecord) -> Self {
        Self {
            pi_names: record.pi_names_text(),
            org_name: record.org_name.clone(),
            org_city: record.org_city.clone(),
            org_state: record.org_state.clone(),
            project_title: record.title.clone(),
            phr: record.public_health_relevance.clone(),
            spending_categories: record
                .spending_categories
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .collect::<Vec<_>>()
                .join("; "),
            fiscal_year: record.fiscal_year.map(|fy| fy.to_string()).unwrap_or_default(),
            support_year: record.support_year.map(|y| y.to_string()).unwrap_or_default(),
            project_start: record.start_date.clone().unwrap_or_default(),
            project_end: record.end_date.clone().unwrap_or_default(),
            total_cost: record.award_amount.map(format_amount).unwrap_or_default(),
            activity: record.activity_code.clone(),
            application_type: record.application_type.clone(),
            full_project_num: record.project_num.clone(),
        }
    }
}

/// 金額を文字列化（整数値なら小数点なし）
fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{}", amount as i64)
    } else {
        amount.to_string()
    }
}

/// 年度文字列を数値に変換（数字以外を含む場合は None）
pub fn parse_fiscal_year(value: &str) -> Option<i32> {
    let value = value.trim();
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}
