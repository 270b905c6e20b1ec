//! 抄録照合フローの統合テスト
//!
//! 検索APIはフェイクに差し替え、戦略のフォールバック順と出力行を検証

mod support;

use grant_scout::error::GrantScoutError;
use grant_scout::finder::{fetch_abstracts, find_match, to_row};
use grant_scout::progress::{ProgressObserver, SilentObserver};
use grant_scout::tabular;
use grant_scout::cli::ExportFormat;
use grant_scout_common::{FetchStatus, MatchResult, Target};
use std::cell::RefCell;
use support::{record, test_config, FakeSearch};
use tempfile::tempdir;

fn target(title: &str, pi_names: &str, fy: &str) -> Target {
    Target {
        title: title.to_string(),
        pi_names: pi_names.to_string(),
        fiscal_year: fy.to_string(),
        activity: "R01".to_string(),
    }
}

/// 失敗した戦略と一致した戦略を記録する
#[derive(Default)]
struct RecordingObserver {
    failed: RefCell<Vec<String>>,
    matched: RefCell<Vec<String>>,
}

impl ProgressObserver for RecordingObserver {
    fn strategy_failed(&self, strategy: &str, _error: &GrantScoutError) {
        self.failed.borrow_mut().push(strategy.to_string());
    }

    fn target_matched(&self, result: &MatchResult) {
        self.matched.borrow_mut().push(result.strategy.clone());
    }
}

/// 最初の戦略で一致したら以降の戦略は呼ばない
#[tokio::test]
async fn test_first_strategy_match_short_circuits() {
    let search = FakeSearch::new().respond(vec![record(
        "Cancer Genomics in Mouse Models",
        "John",
        "Smith",
        2024,
    )]);
    let t = target("Cancer Genomics in Mouse Models", "John Smith", "2024");

    let result = find_match(&search, &t, &test_config(), &SilentObserver)
        .await
        .expect("一致するはず");

    assert_eq!(search.request_count(), 1);
    assert_eq!(result.strategy, "タイトル全文検索");
    assert!((result.score - 1.0).abs() < 1e-9);

    let requests = search.requests.borrow();
    let text_search = requests[0]
        .criteria
        .advanced_text_search
        .as_ref()
        .expect("タイトル検索条件");
    assert_eq!(text_search.search_field, "projecttitle");
    assert_eq!(text_search.search_text, "Cancer Genomics in Mouse Models");
}

/// 0件の戦略は飛ばして次の戦略へ
#[tokio::test]
async fn test_empty_batch_falls_through_to_pi_search() {
    let search = FakeSearch::new().respond(Vec::new()).respond(vec![record(
        "Cancer Genomics in Mouse Models",
        "John",
        "Smith",
        2024,
    )]);
    let t = target("Cancer Genomics in Mouse Models", "John Smith", "2024");
    let observer = RecordingObserver::default();

    let result = find_match(&search, &t, &test_config(), &observer).await;

    assert!(result.is_some());
    assert_eq!(search.request_count(), 2);
    assert_eq!(*observer.matched.borrow(), vec!["PI名検索".to_string()]);

    let requests = search.requests.borrow();
    assert!(requests[1].criteria.pi_names.is_some());
    assert_eq!(requests[1].criteria.fiscal_years, Some(vec![2024]));
}

/// API失敗は記録して次の戦略へ進む
#[tokio::test]
async fn test_failed_strategy_continues() {
    let search = FakeSearch::new()
        .fail("500 Internal Server Error")
        .respond(vec![record("Heart Failure Registry", "Ann", "Jones", 2023)]);
    let t = target("Heart Failure Registry", "Ann Jones", "2023");
    let observer = RecordingObserver::default();

    let result = find_match(&search, &t, &test_config(), &observer).await;

    assert!(result.is_some());
    assert_eq!(*observer.failed.borrow(), vec!["タイトル全文検索".to_string()]);
    assert_eq!(search.request_count(), 2);
}

/// スコアがちょうど閾値（0.3）の候補は採用しない
#[tokio::test]
async fn test_score_equal_to_threshold_is_rejected() {
    let candidate = record("Alpha Beta", "John", "Smith", 2024);
    let search = FakeSearch::new()
        .respond(vec![candidate.clone()])
        .respond(vec![candidate.clone()])
        .respond(vec![candidate.clone()])
        .respond(vec![candidate]);
    let t = target("Gamma Delta", "John Smith", "2024");

    let result = find_match(&search, &t, &test_config(), &SilentObserver).await;

    assert!(result.is_none());
    // タイトル・PI名・キーワード・年度の4戦略すべてを試す
    assert_eq!(search.request_count(), 4);
}

/// 年度が数値でなければ年度戦略は作られない
#[tokio::test]
async fn test_non_numeric_fiscal_year_skips_year_strategy() {
    let search = FakeSearch::new();
    let t = target("Gamma Delta", "John Smith", "FY24");

    let result = find_match(&search, &t, &test_config(), &SilentObserver).await;

    assert!(result.is_none());
    assert_eq!(search.request_count(), 3);
    assert!(search
        .requests
        .borrow()
        .iter()
        .all(|r| r.criteria.activity_codes.is_none()));
}

/// 抄録が空の一致は見つからなかった扱い
#[test]
fn test_match_with_empty_abstract_is_not_found() {
    let t = target("Heart Failure Registry", "Ann Jones", "2023");
    let mut matched = record("Heart Failure Registry", "Ann", "Jones", 2023);
    matched.abstract_text = Some("   ".to_string());
    let result = MatchResult {
        record: matched,
        score: 1.0,
        strategy: "タイトル全文検索".to_string(),
    };

    let row = to_row(&t, Some(&result));
    assert_eq!(row.fetch_status, FetchStatus::NotFound);
    assert_eq!(row.project_title, "Heart Failure Registry");
    assert!(row.abstract_text.is_empty());
}

/// 照合対象1件につき1行、成功/失敗を集計
#[tokio::test]
async fn test_fetch_abstracts_counts_rows() {
    let search = FakeSearch::new().respond(vec![record(
        "Heart Failure Registry",
        "Ann",
        "Jones",
        2023,
    )]);
    let targets = vec![
        target("Heart Failure Registry", "Ann Jones", "2023"),
        target("Unknown Project Title", "Nobody Here", ""),
    ];

    let run = fetch_abstracts(&search, &targets, &test_config(), &SilentObserver).await;

    assert_eq!(run.rows.len(), 2);
    assert_eq!(run.successful, 1);
    assert_eq!(run.failed, 1);
    assert_eq!(run.rows[0].fetch_status, FetchStatus::Success);
    assert_eq!(run.rows[0].abstract_text, "Abstract of Heart Failure Registry");
    assert_eq!(run.rows[1].fetch_status, FetchStatus::NotFound);
    assert_eq!(run.rows[1].pi_names, "Nobody Here");
}

/// 照合対象が0件でもヘッダー行だけのファイルを出力
#[tokio::test]
async fn test_empty_targets_write_header_only() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("project_abstracts.csv");
    let search = FakeSearch::new();

    let run = fetch_abstracts(&search, &[], &test_config(), &SilentObserver).await;
    assert!(run.rows.is_empty());
    assert_eq!(search.request_count(), 0);

    let paths = tabular::write_table(&run.rows, &ExportFormat::Csv, &output, "abstracts").unwrap();
    assert_eq!(paths, vec![output.clone()]);

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        content.trim_end(),
        "PI_NAMEs,PROJECT_TITLE,FISCAL_YEAR,ACTIVITY,PROJECT_NUM,ORG_NAME,ABSTRACT,FETCH_STATUS"
    );
}
