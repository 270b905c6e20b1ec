//! 採用タイミング判定と重複除去
//!
//! ## 判定ルール
//! 1. 終了日なし → 年度が対象年度（2024/2025）なら対象
//! 2. 残り年数 >= 閾値 → 対象
//! 3. 開始から1年以内 → 対象
//! 4. 日付の解析に失敗 → 1. と同じ年度判定にフォールバック

use crate::types::{parse_fiscal_year, CandidateRecord, GrantRow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const DAYS_PER_YEAR: f64 = 365.25;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// タイミング判定の設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingPolicy {
    /// 残り年数の下限
    pub min_years_remaining: f64,
    /// 開始からの経過年数の上限
    pub max_years_since_start: f64,
    /// 日付が使えない場合に対象とする年度
    pub fallback_fiscal_years: Vec<i32>,
}

impl Default for TimingPolicy {
    fn default() -> Self {
        Self {
            min_years_remaining: 1.5,
            max_years_since_start: 1.0,
            fallback_fiscal_years: vec![2024, 2025],
        }
    }
}

/// 判定を通過した理由
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimingReason {
    YearsRemaining(f64),
    RecentStart(f64),
    RecentFiscalYear,
}

impl std::fmt::Display for TimingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimingReason::YearsRemaining(years) => write!(f, "{:.1}y remaining", years),
            TimingReason::RecentStart(years) => write!(f, "Started {:.1}y ago", years),
            TimingReason::RecentFiscalYear => write!(f, "Recent FY"),
        }
    }
}

/// "2024-07-01T00:00:00" のような値の先頭10文字を日付として解析
fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let head = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
}

fn years_between(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64 / DAYS_PER_YEAR
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn in_fallback_years(record: &CandidateRecord, policy: &TimingPolicy) -> bool {
    record
        .fiscal_year
        .map(|fy| policy.fallback_fiscal_years.contains(&fy))
        .unwrap_or(false)
}

/// 日付ベースの判定。日付の解析に失敗した場合は None
fn date_relevance(
    record: &CandidateRecord,
    end: &str,
    today: NaiveDate,
    policy: &TimingPolicy,
) -> Option<bool> {
    let end = parse_date(end)?;
    if years_between(today, end) >= policy.min_years_remaining {
        return Some(true);
    }

    if let Some(start) = non_empty(&record.start_date) {
        let start = parse_date(start)?;
        if years_between(start, today) <= policy.max_years_since_start {
            return Some(true);
        }
    }

    Some(false)
}

/// 採用タイミングとして有望なグラントか判定
pub fn is_relevant(record: &CandidateRecord, today: NaiveDate, policy: &TimingPolicy) -> bool {
    let Some(end) = non_empty(&record.end_date) else {
        return in_fallback_years(record, policy);
    };

    date_relevance(record, end, today, policy).unwrap_or_else(|| in_fallback_years(record, policy))
}

/// 判定を通過した理由を返す（表示用）
pub fn timing_reason(record: &CandidateRecord, today: NaiveDate, policy: &TimingPolicy) -> TimingReason {
    if let Some(end) = non_empty(&record.end_date).and_then(parse_date) {
        let remaining = years_between(today, end);
        if remaining >= policy.min_years_remaining {
            return TimingReason::YearsRemaining(remaining);
        }
    }

    if let Some(start) = non_empty(&record.start_date).and_then(parse_date) {
        let since = years_between(start, today);
        if since <= policy.max_years_since_start {
            return TimingReason::RecentStart(since);
        }
    }

    TimingReason::RecentFiscalYear
}

/// タイトルと年度を持つレコード
pub trait TitledRecord {
    fn title(&self) -> &str;
    fn fiscal_year(&self) -> Option<i32>;
}

impl TitledRecord for CandidateRecord {
    fn title(&self) -> &str {
        &self.title
    }

    fn fiscal_year(&self) -> Option<i32> {
        self.fiscal_year
    }
}

impl TitledRecord for GrantRow {
    fn title(&self) -> &str {
        &self.project_title
    }

    fn fiscal_year(&self) -> Option<i32> {
        parse_fiscal_year(&self.fiscal_year)
    }
}

/// 重複除去で統合されたタイトル
#[derive(Debug, Clone, PartialEq)]
pub struct CollapsedTitle {
    pub title: String,
    pub kept_fiscal_year: i32,
    pub removed: usize,
}

/// 重複除去の結果
#[derive(Debug, Clone)]
pub struct DedupOutcome<T> {
    pub records: Vec<T>,
    pub duplicates_removed: usize,
    /// タイトルなし・年度不正で除外した件数
    pub skipped: usize,
    pub collapsed: Vec<CollapsedTitle>,
}

/// タイトルごとに最新年度の1件だけを残す
///
/// タイトルが空、または年度が数値でないレコードは除外する。
/// 出力順はタイトルの初出順。
pub fn dedupe_by_title<T: TitledRecord>(records: Vec<T>) -> DedupOutcome<T> {
    let mut groups: Vec<(String, Vec<(i32, T)>)> = Vec::new();
    let mut index_by_title: HashMap<String, usize> = HashMap::new();
    let mut skipped = 0;

    for record in records {
        let title = record.title().trim().to_string();
        let fiscal_year = record.fiscal_year();
        let (false, Some(fy)) = (title.is_empty(), fiscal_year) else {
            skipped += 1;
            continue;
        };

        match index_by_title.get(&title) {
            Some(&index) => groups[index].1.push((fy, record)),
            None => {
                index_by_title.insert(title.clone(), groups.len());
                groups.push((title, vec![(fy, record)]));
            }
        }
    }

    let mut kept = Vec::with_capacity(groups.len());
    let mut collapsed = Vec::new();
    let mut duplicates_removed = 0;

    for (title, mut entries) in groups {
        // 安定ソートなので同年度は初出順
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        let removed = entries.len() - 1;
        let (fy, record) = entries.swap_remove(0);

        if removed > 0 {
            duplicates_removed += removed;
            collapsed.push(CollapsedTitle {
                title,
                kept_fiscal_year: fy,
                removed,
            });
        }
        kept.push(record);
    }

    DedupOutcome {
        records: kept,
        duplicates_removed,
        skipped,
        collapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn record_with_dates(start: Option<NaiveDate>, end: Option<NaiveDate>, fy: Option<i32>) -> CandidateRecord {
        CandidateRecord {
            start_date: start.map(|d| format!("{}T00:00:00", d.format(DATE_FORMAT))),
            end_date: end.map(|d| format!("{}T00:00:00", d.format(DATE_FORMAT))),
            fiscal_year: fy,
            ..Default::default()
        }
    }

    #[test]
    fn test_relevant_three_years_remaining() {
        let record = record_with_dates(None, Some(today() + Duration::days(3 * 365)), Some(2020));
        assert!(is_relevant(&record, today(), &TimingPolicy::default()));
    }

    #[test]
    fn test_not_relevant_six_months_no_start() {
        let record = record_with_dates(None, Some(today() + Duration::days(182)), Some(2025));
        assert!(!is_relevant(&record, today(), &TimingPolicy::default()));
    }

    #[test]
    fn test_relevant_recent_start() {
        let record = record_with_dates(
            Some(today() - Duration::days(60)),
            Some(today() + Duration::days(182)),
            Some(2020),
        );
        assert!(is_relevant(&record, today(), &TimingPolicy::default()));
    }

    #[test]
    fn test_not_relevant_old_start() {
        let record = record_with_dates(
            Some(today() - Duration::days(800)),
            Some(today() + Duration::days(182)),
            Some(2025),
        );
        assert!(!is_relevant(&record, today(), &TimingPolicy::default()));
    }

    #[test]
    fn test_no_end_date_uses_fiscal_year() {
        let policy = TimingPolicy::default();
        assert!(is_relevant(&record_with_dates(None, None, Some(2024)), today(), &policy));
        assert!(is_relevant(&record_with_dates(None, None, Some(2025)), today(), &policy));
        assert!(!is_relevant(&record_with_dates(None, None, Some(2023)), today(), &policy));
        assert!(!is_relevant(&record_with_dates(None, None, None), today(), &policy));
    }

    #[test]
    fn test_malformed_date_falls_back() {
        let mut record = CandidateRecord {
            end_date: Some("not a date".into()),
            fiscal_year: Some(2024),
            ..Default::default()
        };
        assert!(is_relevant(&record, today(), &TimingPolicy::default()));
        record.fiscal_year = Some(2019);
        assert!(!is_relevant(&record, today(), &TimingPolicy::default()));
    }

    #[test]
    fn test_malformed_start_date_falls_back() {
        let record = CandidateRecord {
            end_date: Some("2025-12-31".into()),
            start_date: Some("31/12/2024".into()),
            fiscal_year: Some(2025),
            ..Default::default()
        };
        assert!(is_relevant(&record, today(), &TimingPolicy::default()));
    }

    #[test]
    fn test_threshold_is_configurable() {
        // 残り約1.75年
        let record = record_with_dates(None, Some(today() + Duration::days(640)), None);
        let lenient = TimingPolicy::default();
        let strict = TimingPolicy {
            min_years_remaining: 2.0,
            ..Default::default()
        };
        assert!(is_relevant(&record, today(), &lenient));
        assert!(!is_relevant(&record, today(), &strict));
    }

    #[test]
    fn test_timing_reason_display() {
        let policy = TimingPolicy::default();
        let remaining = record_with_dates(None, Some(today() + Duration::days(913)), None);
        assert_eq!(timing_reason(&remaining, today(), &policy).to_string(), "2.5y remaining");

        let started = record_with_dates(
            Some(today() - Duration::days(146)),
            Some(today() + Duration::days(100)),
            None,
        );
        assert_eq!(timing_reason(&started, today(), &policy).to_string(), "Started 0.4y ago");

        let fy_only = record_with_dates(None, None, Some(2024));
        assert_eq!(timing_reason(&fy_only, today(), &policy), TimingReason::RecentFiscalYear);
    }

    fn row(title: &str, fy: &str, num: &str) -> GrantRow {
        GrantRow {
            project_title: title.to_string(),
            fiscal_year: fy.to_string(),
            full_project_num: num.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_dedupe_keeps_latest_fiscal_year() {
        let outcome = dedupe_by_title(vec![row("X", "2022", "a"), row("X", "2024", "b"), row("Y", "2023", "c")]);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].project_title, "X");
        assert_eq!(outcome.records[0].fiscal_year, "2024");
        assert_eq!(outcome.records[1].project_title, "Y");
        assert_eq!(outcome.records[1].fiscal_year, "2023");
        assert_eq!(outcome.duplicates_removed, 1);
        assert_eq!(
            outcome.collapsed,
            vec![CollapsedTitle {
                title: "X".into(),
                kept_fiscal_year: 2024,
                removed: 1
            }]
        );
    }

    #[test]
    fn test_dedupe_tie_keeps_first_seen() {
        let outcome = dedupe_by_title(vec![row("X", "2024", "first"), row("X", "2024", "second")]);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].full_project_num, "first");
    }

    #[test]
    fn test_dedupe_trims_titles() {
        let outcome = dedupe_by_title(vec![row(" X ", "2021", "a"), row("X", "2023", "b")]);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].full_project_num, "b");
    }

    #[test]
    fn test_dedupe_drops_invalid_records() {
        let outcome = dedupe_by_title(vec![
            row("", "2024", "a"),
            row("X", "", "b"),
            row("Y", "FY24", "c"),
            row("Z", "2024", "d"),
        ]);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].project_title, "Z");
        assert_eq!(outcome.skipped, 3);
    }

    #[test]
    fn test_dedupe_candidate_records() {
        let records = vec![
            CandidateRecord {
                title: "X".into(),
                fiscal_year: Some(2022),
                ..Default::default()
            },
            CandidateRecord {
                title: "X".into(),
                fiscal_year: Some(2025),
                ..Default::default()
            },
        ];
        let outcome = dedupe_by_title(records);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].fiscal_year, Some(2025));
    }
}
