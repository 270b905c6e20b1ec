//! 類似度スコア計算モジュール
//!
//! タイトル類似度（ストップワード除去後のJaccard係数）と
//! PI名一致スコアを計算し、重み付きで総合スコアを出す。

use crate::error::{Error, Result};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

lazy_static! {
    /// タイトル比較から除外する一般語
    static ref STOP_WORDS: HashSet<&'static str> = [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "using", "from", "that", "this", "will", "been", "have", "are", "is", "was", "were",
    ]
    .into_iter()
    .collect();
}

/// 共通語がこの数以上ならボーナス加算
const OVERLAP_BONUS_MIN_WORDS: usize = 3;
const OVERLAP_BONUS: f64 = 0.1;

/// 姓のみ一致
const SURNAME_MATCH_SCORE: f64 = 0.8;
/// 姓・名とも一致
const FULL_NAME_MATCH_SCORE: f64 = 1.0;

/// スコアの重みと採用閾値
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub title_weight: f64,
    pub name_weight: f64,
    /// この値を「超えた」場合のみ採用
    pub threshold: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            title_weight: 0.7,
            name_weight: 0.3,
            threshold: 0.3,
        }
    }
}

impl ScoringWeights {
    /// 総合スコア（0.0〜1.0にクランプ）
    pub fn combined(&self, title_score: f64, name_score: f64) -> f64 {
        (self.title_weight * title_score + self.name_weight * name_score).clamp(0.0, 1.0)
    }

    /// 重みと閾値の妥当性チェック
    pub fn validate(&self) -> Result<()> {
        let values = [self.title_weight, self.name_weight, self.threshold];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(Error::Config(format!("重み・閾値は0以上の数値が必要です: {:?}", self)));
        }
        if self.title_weight + self.name_weight <= 0.0 {
            return Err(Error::Config("重みの合計が0です".into()));
        }
        if self.threshold >= 1.0 {
            return Err(Error::Config(format!("閾値は1.0未満が必要です: {}", self.threshold)));
        }
        Ok(())
    }

    /// 閾値判定（境界値は不採用）
    pub fn accepts(&self, score: f64) -> bool {
        score > self.threshold
    }
}

fn content_words(normalized: &str) -> HashSet<&str> {
    normalized
        .split_whitespace()
        .filter(|w| !STOP_WORDS.contains(*w))
        .collect()
}

/// タイトル類似度を計算
///
/// 正規化（小文字化・trim）後に完全一致なら 1.0。
/// それ以外はストップワードを除いた単語集合のJaccard係数に、
/// 共通語が3語以上ならボーナス 0.1 を加える（上限 1.0）。
pub fn title_similarity(a: &str, b: &str) -> f64 {
    // 空判定は正規化前の値で行う（空白のみの同一文字列は完全一致扱い）
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a == b {
        return 1.0;
    }

    let words_a = content_words(&a);
    let words_b = content_words(&b);
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    let mut score = if union > 0 {
        intersection as f64 / union as f64
    } else {
        0.0
    };

    if intersection >= OVERLAP_BONUS_MIN_WORDS {
        score += OVERLAP_BONUS;
    }

    score.min(1.0)
}

/// PI名一致スコアを計算
///
/// `target_names` はセミコロン区切り。各名の最後の語を姓とみなし、
/// 姓（3文字以上）が候補側の文字列に含まれれば 0.8、
/// 先頭語（2文字以上）も含まれれば 1.0。全PIの最大値を返す。
pub fn name_match_score(target_names: &str, candidate_names: &str) -> f64 {
    if target_names.trim().is_empty() || candidate_names.trim().is_empty() {
        return 0.0;
    }

    let candidate_upper = candidate_names.to_uppercase();
    let mut best: f64 = 0.0;

    for part in target_names.split(';') {
        let part = part.trim().to_uppercase();
        let words: Vec<&str> = part.split_whitespace().collect();
        let Some(last_name) = words.last() else {
            continue;
        };

        if last_name.chars().count() <= 2 || !candidate_upper.contains(*last_name) {
            continue;
        }

        let mut score = SURNAME_MATCH_SCORE;
        if words.len() > 1 {
            let first_name = words[0];
            if first_name.chars().count() > 1 && candidate_upper.contains(first_name) {
                score = FULL_NAME_MATCH_SCORE;
            }
        }
        best = best.max(score);
    }

    best
}
