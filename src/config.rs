use crate::error::{GrantScoutError, Result};
use grant_scout_common::{ScoringWeights, TimingPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://api.reporter.nih.gov/v2/projects/search";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,

    /// 抄録検索で使う機関名（部分一致）
    pub search_org_names: Vec<String>,
    /// 一括取得・年度検索で使う機関名（完全一致）
    pub exact_org_names: Vec<String>,

    /// 一括取得の対象年度
    pub fiscal_years: Vec<i32>,
    /// 一括取得の対象種目（ゴールドティア）
    pub gold_tier_codes: Vec<String>,
    /// 年度検索（戦略4）の対象種目
    pub recent_activity_codes: Vec<String>,
    /// 一括取得時に子プロジェクトを除外
    pub exclude_subprojects: bool,

    /// 一括取得の1ページ件数
    pub page_size: usize,
    /// 抄録検索の1リクエスト件数
    pub search_limit: usize,
    /// 抄録検索のリクエスト間隔
    pub search_delay_ms: u64,
    /// 一括取得のリクエスト間隔
    pub bulk_delay_ms: u64,

    pub timing: TimingPolicy,
    pub scoring: ScoringWeights,

    /// 集計を書き込むREADME
    pub readme_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            search_org_names: vec!["MAYO".into()],
            exact_org_names: vec!["MAYO CLINIC ROCHESTER".into()],
            fiscal_years: vec![2022, 2023, 2024, 2025],
            gold_tier_codes: [
                "R01", "R35", "R37", "RF1", "R00", "P01", "P30", "P50", "U01", "U19", "U54",
                "UF1", "RC2", "UH3", "U24", "U10", "UL1",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            recent_activity_codes: ["R01", "R37", "R35", "U01", "U24", "P01", "P30", "P50"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            exclude_subprojects: true,
            page_size: 500,
            search_limit: 100,
            search_delay_ms: 500,
            bulk_delay_ms: 1000,
            timing: TimingPolicy::default(),
            scoring: ScoringWeights::default(),
            readme_path: PathBuf::from("README.md"),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| GrantScoutError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("grant-scout").join("config.json"))
    }

    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()?;

        if self.page_size == 0 || self.search_limit == 0 {
            return Err(GrantScoutError::Config("page_size / search_limit は1以上が必要です".into()));
        }
        if !self.timing.min_years_remaining.is_finite() || !self.timing.max_years_since_start.is_finite() {
            return Err(GrantScoutError::Config("timing の年数が不正です".into()));
        }
        Ok(())
    }
}
