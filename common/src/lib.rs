//! Grant Scout Common Library
//!
//! 検索APIに依存しない型と純粋ロジック（スコア計算・照合・絞込み・集計）

pub mod types;
pub mod error;
pub mod similarity;
pub mod matcher;
pub mod filter;
pub mod stats;

pub use types::{
    AbstractRow, CandidateRecord, FetchStatus, GrantRow, MatchResult, PiName, Target,
    parse_fiscal_year,
};
pub use error::{Error, Result};
pub use similarity::{name_match_score, title_similarity, ScoringWeights};
pub use matcher::{score_candidate, select_best};
pub use filter::{
    dedupe_by_title, is_relevant, timing_reason, CollapsedTitle, DedupOutcome, TimingPolicy,
    TimingReason, TitledRecord,
};
pub use stats::{format_thousands, GrantStats};
