//! 一括取得モジュール
//!
//! ## 処理フロー
//! 1. 機関・年度・種目でページ単位に全件取得
//! 2. 採用タイミングで絞込み
//! 3. タイトル単位で最新年度のみ残す（任意）

use crate::api::{bulk_request, ProjectSearch, TARGET_API_REQUEST};
use crate::config::Config;
use crate::progress::ProgressObserver;
use chrono::NaiveDate;
use grant_scout_common::{
    dedupe_by_title, is_relevant, timing_reason, CandidateRecord, GrantRow, TimingPolicy,
};
use tracing::{debug, warn};

/// 一括取得のオプション
#[derive(Debug, Clone)]
pub struct GrantOptions {
    /// 判定の基準日
    pub today: NaiveDate,
    /// タイトル単位の重複除去を行う
    pub dedupe: bool,
}

/// 一括取得の実行結果
#[derive(Debug, Clone, Default)]
pub struct GrantRun {
    pub fetched: usize,
    pub relevant: usize,
    pub duplicates_removed: usize,
    pub rows: Vec<GrantRow>,
}

/// 全ページを順に取得（失敗・空ページ・端数ページで終了）
pub async fn fetch_all_projects<S, O>(search: &S, config: &Config, observer: &O) -> Vec<CandidateRecord>
where
    S: ProjectSearch,
    O: ProgressObserver + ?Sized,
{
    let mut request = bulk_request(config);
    let mut projects = Vec::new();

    loop {
        observer.page_requested(request.offset, request.limit);

        let page = match search.search(&request).await {
            Ok(page) => page,
            Err(e) => {
                warn!(target: TARGET_API_REQUEST, "page at offset {} failed: {}", request.offset, e);
                observer.page_failed(&e);
                break;
            }
        };

        if page.is_empty() {
            break;
        }

        let count = page.len();
        projects.extend(page);
        observer.page_fetched(count, projects.len());

        if count < request.limit {
            break;
        }
        request.offset += request.limit;
    }

    debug!("fetched {} projects in total", projects.len());
    projects
}

/// 採用タイミングで絞込んで出力行に変換
pub fn process_projects<O>(
    projects: &[CandidateRecord],
    today: NaiveDate,
    policy: &TimingPolicy,
    observer: &O,
) -> Vec<GrantRow>
where
    O: ProgressObserver + ?Sized,
{
    let mut rows = Vec::new();

    for project in projects {
        if !is_relevant(project, today, policy) {
            continue;
        }
        rows.push(GrantRow::from(project));
        observer.grant_kept(rows.len(), project, timing_reason(project, today, policy));
    }

    observer.filter_finished(rows.len(), projects.len());
    rows
}

/// 取得 → 絞込み → 重複除去
pub async fn collect_grants<S, O>(
    search: &S,
    config: &Config,
    options: &GrantOptions,
    observer: &O,
) -> GrantRun
where
    S: ProjectSearch,
    O: ProgressObserver + ?Sized,
{
    let projects = fetch_all_projects(search, config, observer).await;
    let mut run = GrantRun {
        fetched: projects.len(),
        ..Default::default()
    };
    if projects.is_empty() {
        return run;
    }

    let rows = process_projects(&projects, options.today, &config.timing, observer);
    run.relevant = rows.len();

    run.rows = if options.dedupe && !rows.is_empty() {
        let outcome = dedupe_by_title(rows);
        observer.dedup_finished(&outcome.collapsed, outcome.duplicates_removed, outcome.records.len());
        run.duplicates_removed = outcome.duplicates_removed;
        outcome.records
    } else {
        rows
    };

    run
}
