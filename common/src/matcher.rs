//! 候補照合モジュール
//!
//! 1つの検索戦略が返した候補群から、照合対象に最も近いレコードを選ぶ。
//! 戦略間のフォールバックは呼び出し側（CLIの finder）が行う。

use crate::similarity::{name_match_score, title_similarity, ScoringWeights};
use crate::types::{CandidateRecord, MatchResult, Target};

/// 候補1件の総合スコア
pub fn score_candidate(target: &Target, candidate: &CandidateRecord, weights: &ScoringWeights) -> f64 {
    let title_score = title_similarity(&target.title, &candidate.title);
    let name_score = name_match_score(&target.pi_names, &candidate.pi_names_text());
    weights.combined(title_score, name_score)
}

/// 候補群から最良の1件を選ぶ
///
/// スコアが閾値を超えたものだけが対象。同点の場合は先に出現した候補を残す。
pub fn select_best(
    target: &Target,
    candidates: &[CandidateRecord],
    weights: &ScoringWeights,
    strategy: &str,
) -> Option<MatchResult> {
    let mut best: Option<(usize, f64)> = None;

    for (index, candidate) in candidates.iter().enumerate() {
        let score = score_candidate(target, candidate, weights);
        if !weights.accepts(score) {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((index, score)),
        }
    }

    best.map(|(index, score)| MatchResult {
        record: candidates[index].clone(),
        score,
        strategy: strategy.to_string(),
    })
}
