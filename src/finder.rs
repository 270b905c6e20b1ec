//! 抄録照合モジュール
//!
//! 照合対象ごとに検索戦略を優先順に試し、最初に閾値を超えた候補を採用する。
//! 戦略の結果はマージしない（前の戦略が0件・閾値未満・失敗の場合のみ次へ進む）。

use crate::api::{strategies_for, ProjectSearch, TARGET_API_REQUEST};
use crate::config::Config;
use crate::progress::ProgressObserver;
use grant_scout_common::{select_best, AbstractRow, FetchStatus, MatchResult, Target};
use tracing::{debug, info, warn};

/// 抄録照合の実行結果
#[derive(Debug, Clone, Default)]
pub struct AbstractRun {
    /// 照合対象1件につき1行
    pub rows: Vec<AbstractRow>,
    pub successful: usize,
    pub failed: usize,
}

/// 1件の照合対象に一致するプロジェクトを探す
pub async fn find_match<S, O>(
    search: &S,
    target: &Target,
    config: &Config,
    observer: &O,
) -> Option<MatchResult>
where
    S: ProjectSearch,
    O: ProgressObserver + ?Sized,
{
    for strategy in strategies_for(target, config) {
        let candidates = match search.search(&strategy.request).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(target: TARGET_API_REQUEST, "{} failed: {}", strategy.label, e);
                observer.strategy_failed(&strategy.label, &e);
                continue;
            }
        };

        if candidates.is_empty() {
            debug!("{}: 候補なし", strategy.label);
            continue;
        }

        match select_best(target, &candidates, &config.scoring, &strategy.label) {
            Some(result) => {
                info!(
                    "found via {} (score: {:.2}) for {:?}",
                    result.strategy, result.score, target.title
                );
                observer.target_matched(&result);
                return Some(result);
            }
            None => debug!(
                "{}: {}件中に閾値を超える候補なし",
                strategy.label,
                candidates.len()
            ),
        }
    }

    None
}

/// 照合結果を出力行に変換（抄録が空なら見つからなかった扱い）
pub fn to_row(target: &Target, result: Option<&MatchResult>) -> AbstractRow {
    match result {
        Some(result)
            if result
                .record
                .abstract_text
                .as_deref()
                .is_some_and(|a| !a.trim().is_empty()) =>
        {
            AbstractRow::found(result)
        }
        _ => AbstractRow::not_found(target),
    }
}

/// 全照合対象の抄録を取得
pub async fn fetch_abstracts<S, O>(
    search: &S,
    targets: &[Target],
    config: &Config,
    observer: &O,
) -> AbstractRun
where
    S: ProjectSearch,
    O: ProgressObserver + ?Sized,
{
    let mut run = AbstractRun::default();
    let total = targets.len();

    for (i, target) in targets.iter().enumerate() {
        observer.target_started(i + 1, total, target);

        let result = find_match(search, target, config, observer).await;
        let row = to_row(target, result.as_ref());

        match row.fetch_status {
            FetchStatus::Success => run.successful += 1,
            FetchStatus::NotFound => run.failed += 1,
        }
        observer.target_finished(&row);
        run.rows.push(row);
    }

    observer.targets_finished(run.successful, run.failed);
    run
}
