//! 進捗通知モジュール
//!
//! 照合・一括取得の処理本体は結果値を返すだけで、表示はここで行う。
//! コンソール表示（ConsoleObserver）と無出力（SilentObserver）を用意する。

use crate::error::GrantScoutError;
use grant_scout_common::{
    AbstractRow, CandidateRecord, CollapsedTitle, FetchStatus, MatchResult, Target, TimingReason,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;

/// 詳細表示する採用グラントの件数
const KEPT_PREVIEW_LIMIT: usize = 5;

/// 進捗イベントの受け手（全メソッドにデフォルトの空実装あり）
pub trait ProgressObserver {
    fn targets_loaded(&self, _total: usize) {}
    fn target_started(&self, _index: usize, _total: usize, _target: &Target) {}
    fn strategy_failed(&self, _strategy: &str, _error: &GrantScoutError) {}
    fn target_matched(&self, _result: &MatchResult) {}
    fn target_finished(&self, _row: &AbstractRow) {}
    fn targets_finished(&self, _successful: usize, _failed: usize) {}

    fn page_requested(&self, _offset: usize, _limit: usize) {}
    fn page_fetched(&self, _count: usize, _total: usize) {}
    fn page_failed(&self, _error: &GrantScoutError) {}
    fn grant_kept(&self, _kept_so_far: usize, _record: &CandidateRecord, _reason: TimingReason) {}
    fn filter_finished(&self, _kept: usize, _total: usize) {}
    fn dedup_finished(&self, _collapsed: &[CollapsedTitle], _removed: usize, _kept: usize) {}
}

/// 何も表示しない
pub struct SilentObserver;

impl ProgressObserver for SilentObserver {}

/// コンソールに進捗を表示
#[derive(Default)]
pub struct ConsoleObserver {
    bar: RefCell<Option<ProgressBar>>,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// プログレスバーがあればその上に、なければ標準出力に出す
    fn line(&self, message: String) {
        match self.bar.borrow().as_ref() {
            Some(bar) => bar.println(message),
            None => println!("{}", message),
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

impl ProgressObserver for ConsoleObserver {
    fn targets_loaded(&self, total: usize) {
        println!("✔ {}件の照合対象を読み込みました\n", total);
        if total == 0 {
            return;
        }
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template("  [{bar:30}] {pos}/{len} {msg}") {
            bar.set_style(style.progress_chars("=> "));
        }
        *self.bar.borrow_mut() = Some(bar);
    }

    fn target_started(&self, index: usize, total: usize, target: &Target) {
        self.line(format!("[{}/{}] 検索中: {}...", index, total, truncate(&target.title, 60)));
    }

    fn strategy_failed(&self, strategy: &str, error: &GrantScoutError) {
        self.line(format!("    ⚠ {} でAPI呼び出しに失敗: {}", strategy, error));
    }

    fn target_matched(&self, result: &MatchResult) {
        self.line(format!("    {} で一致 (スコア: {:.2})", result.strategy, result.score));
    }

    fn target_finished(&self, row: &AbstractRow) {
        match row.fetch_status {
            FetchStatus::Success => {
                self.line(format!("  ✔ 抄録を取得 ({}文字)", row.abstract_text.chars().count()))
            }
            FetchStatus::NotFound => self.line("  ✗ 抄録が見つかりません".to_string()),
        }
        if let Some(bar) = self.bar.borrow().as_ref() {
            bar.inc(1);
        }
    }

    fn targets_finished(&self, successful: usize, failed: usize) {
        if let Some(bar) = self.bar.borrow_mut().take() {
            bar.finish_and_clear();
        }
        println!("\n集計: 成功 {}件, 失敗 {}件", successful, failed);
    }

    fn page_requested(&self, offset: usize, limit: usize) {
        println!("{}〜{}件目を取得中...", offset + 1, offset + limit);
    }

    fn page_fetched(&self, count: usize, total: usize) {
        println!("✔ {}件取得 (累計: {}件)", count, total);
    }

    fn page_failed(&self, error: &GrantScoutError) {
        println!("⚠ API呼び出しに失敗: {}", error);
    }

    fn grant_kept(&self, kept_so_far: usize, record: &CandidateRecord, reason: TimingReason) {
        if kept_so_far > KEPT_PREVIEW_LIMIT {
            return;
        }
        println!(
            "✔ {} - {}: {} - {}...",
            record.activity_code,
            reason,
            truncate(&record.primary_pi(), 20),
            truncate(&record.title, 40)
        );
    }

    fn filter_finished(&self, kept: usize, total: usize) {
        let ratio = if total > 0 {
            kept as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        println!("\n絞込み結果: {}/{}件を採用 ({:.1}%)", kept, total, ratio);
    }

    fn dedup_finished(&self, collapsed: &[CollapsedTitle], removed: usize, kept: usize) {
        for item in collapsed {
            println!(
                "  FY{} を採用: {}...",
                item.kept_fiscal_year,
                truncate(&item.title, 50)
            );
        }
        println!("重複 {}件を除去、{}件を保持", removed, kept);
    }
}
