//! 集計モジュール
//!
//! 一括取得モードの出力行から種目別・年度別の件数と助成総額を集計する。

use crate::types::GrantRow;
use std::collections::HashMap;

/// センター系グラント（P30/P50）
const CENTER_ACTIVITY_CODES: [&str; 2] = ["P30", "P50"];

/// 集計結果
#[derive(Debug, Clone, PartialEq)]
pub struct GrantStats {
    pub total_grants: usize,
    /// (種目, 件数) 件数の降順
    pub activity_counts: Vec<(String, usize)>,
    /// (年度, 件数) 年度の降順
    pub fiscal_year_counts: Vec<(String, usize)>,
    pub total_funding: f64,
    pub avg_funding: f64,
    pub r01_count: usize,
    pub center_grants: usize,
}

impl GrantStats {
    /// 行が空なら None
    pub fn from_rows(rows: &[GrantRow]) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }

        let mut activity: HashMap<&str, usize> = HashMap::new();
        let mut fiscal_years: HashMap<&str, usize> = HashMap::new();
        let mut total_funding = 0.0;

        for row in rows {
            let code = row.activity.trim();
            if !code.is_empty() {
                *activity.entry(code).or_default() += 1;
            }
            let fy = row.fiscal_year.trim();
            if !fy.is_empty() {
                *fiscal_years.entry(fy).or_default() += 1;
            }
            if let Some(amount) = parse_cost(&row.total_cost) {
                total_funding += amount;
            }
        }

        let count_of = |code: &str| activity.get(code).copied().unwrap_or(0);
        let r01_count = count_of("R01");
        let center_grants = CENTER_ACTIVITY_CODES.iter().map(|c| count_of(*c)).sum();

        let mut activity_counts: Vec<(String, usize)> =
            activity.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        activity_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut fiscal_year_counts: Vec<(String, usize)> =
            fiscal_years.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        fiscal_year_counts.sort_by(|a, b| b.0.cmp(&a.0));

        Some(Self {
            total_grants: rows.len(),
            activity_counts,
            fiscal_year_counts,
            total_funding,
            avg_funding: total_funding / rows.len() as f64,
            r01_count,
            center_grants,
        })
    }

    /// 上位 n 種目
    pub fn top_activity_codes(&self, n: usize) -> &[(String, usize)] {
        &self.activity_counts[..n.min(self.activity_counts.len())]
    }

    /// R01の割合（%）
    pub fn r01_share(&self) -> f64 {
        if self.total_grants == 0 {
            return 0.0;
        }
        self.r01_count as f64 / self.total_grants as f64 * 100.0
    }
}

/// "1,250,000" や "980000.50" を数値に変換。数字・カンマ・小数点以外を含む場合は None
fn parse_cost(value: &str) -> Option<f64> {
    let value = value.trim();
    let digits_only: String = value.chars().filter(|c| *c != '.' && *c != ',').collect();
    if digits_only.is_empty() || !digits_only.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    value.replace(',', "").parse().ok()
}

/// 千の位区切りで整数表示（四捨五入）
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0 {
        out.insert(0, '-');
    }
    out
}
