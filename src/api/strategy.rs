//! 検索戦略の組み立て
//!
//! 照合対象1件につき、優先順に最大4つの検索条件を作る:
//! 1. タイトル全文検索 + 機関
//! 2. PI名 + 機関（年度があれば年度も）
//! 3. タイトルのキーワード検索（タイトル + 抄録）
//! 4. 機関（完全一致） + 年度 + 主要種目

use super::types::{AdvancedTextSearch, Criteria, PiNameQuery, SearchRequest};
use crate::config::Config;
use grant_scout_common::Target;

/// 抄録検索で取得する項目
pub const ABSTRACT_FIELDS: [&str; 7] = [
    "ProjectTitle",
    "AbstractText",
    "PrincipalInvestigators",
    "FiscalYear",
    "ProjectNum",
    "ActivityCode",
    "OrgName",
];

/// 一括取得で取得する項目
pub const GRANT_FIELDS: [&str; 15] = [
    "PrincipalInvestigators",
    "OrgName",
    "OrgCity",
    "OrgState",
    "ProjectTitle",
    "PublicHealthRelevance",
    "SpendingCategories",
    "FiscalYear",
    "SupportYear",
    "ProjectStartDate",
    "ProjectEndDate",
    "AwardAmount",
    "ActivityCode",
    "ApplicationTypeCode",
    "ProjectNum",
];

/// キーワード抽出で除外する語
const KEY_TERM_STOP_WORDS: [&str; 11] = [
    "with", "using", "from", "for", "and", "the", "that", "this", "will", "been", "have",
];
const KEY_TERM_MIN_LEN: usize = 4;
const KEY_TERM_MIN_COUNT: usize = 2;
const KEY_TERM_MAX_COUNT: usize = 5;

/// 検索戦略（ラベル + リクエスト）
#[derive(Debug, Clone)]
pub struct SearchStrategy {
    pub label: String,
    pub request: SearchRequest,
}

fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn abstract_request(criteria: Criteria, config: &Config) -> SearchRequest {
    SearchRequest {
        criteria,
        include_fields: fields(&ABSTRACT_FIELDS),
        offset: 0,
        limit: config.search_limit,
        use_relevance: Some(true),
        ..Default::default()
    }
}

/// "John Smith; Doe" → [Full{John, Smith}, Any{Doe}]
pub fn pi_name_queries(pi_names: &str) -> Vec<PiNameQuery> {
    pi_names
        .split(';')
        .filter_map(|name| {
            let parts: Vec<&str> = name.split_whitespace().collect();
            match parts.as_slice() {
                [] => None,
                [only] => Some(PiNameQuery::Any {
                    any_name: only.to_string(),
                }),
                [first, .., last] => Some(PiNameQuery::Full {
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                }),
            }
        })
        .collect()
}

/// タイトルから検索用キーワードを抽出（2語未満なら None）
pub fn key_terms(title: &str) -> Option<String> {
    let words: Vec<&str> = title
        .split_whitespace()
        .filter(|w| w.chars().count() >= KEY_TERM_MIN_LEN)
        .filter(|w| !KEY_TERM_STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .collect();

    if words.len() < KEY_TERM_MIN_COUNT {
        return None;
    }
    Some(words.into_iter().take(KEY_TERM_MAX_COUNT).collect::<Vec<_>>().join(" "))
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// 照合対象の検索戦略を優先順に作る
pub fn strategies_for(target: &Target, config: &Config) -> Vec<SearchStrategy> {
    let mut strategies = Vec::new();
    let title = target.title.trim();
    let fiscal_year = target.numeric_fiscal_year();

    if !title.is_empty() {
        strategies.push(SearchStrategy {
            label: "タイトル全文検索".into(),
            request: abstract_request(
                Criteria {
                    advanced_text_search: Some(AdvancedTextSearch::all_words("projecttitle", title)),
                    org_names: Some(config.search_org_names.clone()),
                    include_active_projects: Some(true),
                    ..Default::default()
                },
                config,
            ),
        });
    }

    let pi_queries = pi_name_queries(&target.pi_names);
    if !pi_queries.is_empty() {
        strategies.push(SearchStrategy {
            label: "PI名検索".into(),
            request: abstract_request(
                Criteria {
                    pi_names: Some(pi_queries),
                    org_names: Some(config.search_org_names.clone()),
                    fiscal_years: fiscal_year.map(|fy| vec![fy]),
                    include_active_projects: Some(true),
                    ..Default::default()
                },
                config,
            ),
        });
    }

    if let Some(terms) = key_terms(title) {
        strategies.push(SearchStrategy {
            label: format!("キーワード検索: {}", truncate_chars(&terms, 50)),
            request: abstract_request(
                Criteria {
                    advanced_text_search: Some(AdvancedTextSearch::all_words(
                        "projecttitle,abstracttext",
                        &terms,
                    )),
                    org_names: Some(config.search_org_names.clone()),
                    include_active_projects: Some(true),
                    ..Default::default()
                },
                config,
            ),
        });
    }

    if let Some(fy) = fiscal_year {
        strategies.push(SearchStrategy {
            label: format!("機関 + FY{} + 主要種目", fy),
            request: abstract_request(
                Criteria {
                    org_names_exact_match: Some(config.exact_org_names.clone()),
                    fiscal_years: Some(vec![fy]),
                    activity_codes: Some(config.recent_activity_codes.clone()),
                    include_active_projects: Some(true),
                    ..Default::default()
                },
                config,
            ),
        });
    }

    strategies
}

/// 一括取得のリクエスト（offset は呼び出し側で更新）
pub fn bulk_request(config: &Config) -> SearchRequest {
    SearchRequest {
        criteria: Criteria {
            org_names_exact_match: Some(config.exact_org_names.clone()),
            include_active_projects: Some(true),
            fiscal_years: Some(config.fiscal_years.clone()),
            activity_codes: Some(config.gold_tier_codes.clone()),
            exclude_subprojects: config.exclude_subprojects.then_some(true),
            ..Default::default()
        },
        include_fields: fields(&GRANT_FIELDS),
        offset: 0,
        limit: config.page_size,
        sort_field: Some("FiscalYear".into()),
        sort_order: Some("desc".into()),
        use_relevance: None,
    }
}
