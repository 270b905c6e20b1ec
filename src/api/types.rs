//! RePORTER API のリクエスト/レスポンス型
//!
//! レスポンスは項目の型が揺れる（数値/文字列、辞書/文字列の配列）ため、
//! 緩い型で受けてから CandidateRecord に変換する。

use super::TARGET_API_REQUEST;
use grant_scout_common::{CandidateRecord, PiName};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// 検索リクエスト
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchRequest {
    pub criteria: Criteria,
    pub include_fields: Vec<String>,
    pub offset: usize,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_relevance: Option<bool>,
}

/// 検索条件
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Criteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_names_exact_match: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiscal_years: Option<Vec<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_codes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced_text_search: Option<AdvancedTextSearch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pi_names: Option<Vec<PiNameQuery>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_active_projects: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_subprojects: Option<bool>,
}

/// 全文検索条件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvancedTextSearch {
    pub operator: String,
    pub search_field: String,
    pub search_text: String,
}

impl AdvancedTextSearch {
    pub fn all_words(search_field: &str, search_text: &str) -> Self {
        Self {
            operator: "and".into(),
            search_field: search_field.into(),
            search_text: search_text.into(),
        }
    }
}

/// PI名の検索条件
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PiNameQuery {
    Full { first_name: String, last_name: String },
    Any { any_name: String },
}

/// 検索レスポンス
///
/// 1件ずつ変換するため、結果は生のJSON値で受ける。
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Option<Vec<Value>>,
}

impl SearchResponse {
    /// 変換できないレコードは読み飛ばす（ページ全体は捨てない）
    pub fn into_records(self) -> Vec<CandidateRecord> {
        self.results
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value::<RawProject>(value) {
                Ok(raw) => Some(CandidateRecord::from(raw)),
                Err(e) => {
                    warn!(target: TARGET_API_REQUEST, "skipped result #{}: {}", index, e);
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawPrincipalInvestigator {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawOrganization {
    pub org_name: Option<String>,
    pub name: Option<String>,
    pub org_city: Option<String>,
    pub city: Option<String>,
    pub org_state: Option<String>,
    pub state: Option<String>,
}

/// `org_*` を優先し、空なら旧名の項目を使う
fn prefer(primary: Option<String>, fallback: Option<String>) -> String {
    let primary = text(primary);
    if primary.is_empty() {
        text(fallback)
    } else {
        primary
    }
}

/// APIが返すプロジェクト1件
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawProject {
    pub project_title: Option<String>,
    pub abstract_text: Option<String>,
    pub principal_investigators: Option<Vec<RawPrincipalInvestigator>>,
    pub fiscal_year: Option<Value>,
    pub full_project_num: Option<String>,
    pub activity_code: Option<String>,
    pub organization: Option<RawOrganization>,
    pub project_start_date: Option<String>,
    pub project_end_date: Option<String>,
    pub phr_text: Option<String>,
    pub phr: Option<String>,
    pub spending_categories: Option<Vec<Value>>,
    pub support_year: Option<Value>,
    pub award_amount: Option<Value>,
    pub application_type_code: Option<Value>,
}

fn text(value: Option<String>) -> String {
    value.map(|s| s.trim().to_string()).unwrap_or_default()
}

fn value_to_i32(value: &Option<Value>) -> Option<i32> {
    match value.as_ref()? {
        Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_to_f64(value: &Option<Value>) -> Option<f64> {
    match value.as_ref()? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

fn value_to_string(value: &Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// {"name": "..."} と "..." の両方を受け付ける
fn spending_category_name(value: &Value) -> Option<String> {
    let name = match value {
        Value::Object(map) => map.get("name")?.as_str()?,
        Value::String(s) => s.as_str(),
        _ => return None,
    };
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

impl From<RawProject> for CandidateRecord {
    fn from(raw: RawProject) -> Self {
        let pi_names = raw
            .principal_investigators
            .unwrap_or_default()
            .into_iter()
            .map(|pi| PiName::new(text(pi.first_name), text(pi.last_name)))
            .collect();
        let organization = raw.organization.unwrap_or_default();
        let non_empty = |s: Option<String>| s.filter(|v| !v.trim().is_empty());

        CandidateRecord {
            title: text(raw.project_title),
            abstract_text: non_empty(raw.abstract_text),
            pi_names,
            fiscal_year: value_to_i32(&raw.fiscal_year),
            project_num: text(raw.full_project_num),
            activity_code: text(raw.activity_code),
            org_name: prefer(organization.org_name, organization.name),
            start_date: non_empty(raw.project_start_date),
            end_date: non_empty(raw.project_end_date),
            org_city: prefer(organization.org_city, organization.city),
            org_state: prefer(organization.org_state, organization.state),
            public_health_relevance: prefer(raw.phr_text, raw.phr),
            spending_categories: raw
                .spending_categories
                .unwrap_or_default()
                .iter()
                .filter_map(spending_category_name)
                .collect(),
            support_year: value_to_i32(&raw.support_year),
            award_amount: value_to_f64(&raw.award_amount),
            application_type: value_to_string(&raw.application_type_code),
        }
    }
}
