//! READMEの集計セクション更新
//!
//! `## Key Statistics` から次の `## X` 見出し（なければ末尾）までを差し替える。
//! セクションが無い場合は `## Target Recommendations` の直前に挿入する。

use crate::error::Result;
use crate::tabular::write_atomically;
use grant_scout_common::{format_thousands, GrantStats};
use regex::Regex;
use std::io::Write;
use std::path::Path;
use tracing::debug;

lazy_static::lazy_static! {
    static ref SECTION_RE: Regex = Regex::new(r"## Key Statistics").unwrap();
    static ref NEXT_HEADING_RE: Regex = Regex::new(r"## [A-Z]").unwrap();
    static ref ANCHOR_RE: Regex = Regex::new(r"## Target Recommendations").unwrap();
}

/// README更新の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadmeUpdate {
    Updated,
    /// 差し替え先も挿入位置も無い
    Unchanged,
    /// READMEが存在しない
    Missing,
}

/// 集計セクションのMarkdown
pub fn render_key_statistics(stats: &GrantStats) -> String {
    format!(
        "## Key Statistics\n\
         - **{} hiring-relevant grants** identified\n\
         - **${} total funding** (${} average per grant)\n\
         - **{} R01 grants** ({:.0}%) - independent researchers with hiring authority\n\
         - **{} P30/P50 center grants** - highest computational hiring probability",
        stats.total_grants,
        format_thousands(stats.total_funding),
        format_thousands(stats.avg_funding),
        stats.r01_count,
        stats.r01_share(),
        stats.center_grants,
    )
}

/// セクションを差し替えた本文を返す。変更箇所が無ければ None
pub fn patch_readme(content: &str, section: &str) -> Option<String> {
    if let Some(found) = SECTION_RE.find(content) {
        let rest = &content[found.end()..];
        let end = NEXT_HEADING_RE
            .find(rest)
            .map(|m| found.end() + m.start())
            .unwrap_or(content.len());
        return Some(format!(
            "{}{}\n\n{}",
            &content[..found.start()],
            section,
            &content[end..]
        ));
    }

    let anchor = ANCHOR_RE.find(content)?;
    Some(format!(
        "{}{}\n\n{}",
        &content[..anchor.start()],
        section,
        &content[anchor.start()..]
    ))
}

/// READMEファイルの集計セクションを更新
pub fn update_readme(path: &Path, stats: &GrantStats) -> Result<ReadmeUpdate> {
    if !path.exists() {
        return Ok(ReadmeUpdate::Missing);
    }

    let content = std::fs::read_to_string(path)?;
    let section = render_key_statistics(stats);
    match patch_readme(&content, &section) {
        Some(updated) => {
            write_atomically(path, |file| {
                file.write_all(updated.as_bytes())?;
                Ok(())
            })?;
            debug!("updated statistics in {}", path.display());
            Ok(ReadmeUpdate::Updated)
        }
        None => Ok(ReadmeUpdate::Unchanged),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stats() -> GrantStats {
        GrantStats {
            total_grants: 4,
            activity_counts: vec![("R01".into(), 2), ("P30".into(), 1), ("U01".into(), 1)],
            fiscal_year_counts: vec![("2024".into(), 4)],
            total_funding: 2_500_000.0,
            avg_funding: 625_000.0,
            r01_count: 2,
            center_grants: 1,
        }
    }

    #[test]
    fn test_render_key_statistics() {
        let text = render_key_statistics(&sample_stats());
        assert!(text.starts_with("## Key Statistics\n"));
        assert!(text.contains("**4 hiring-relevant grants**"));
        assert!(text.contains("$2,500,000 total funding"));
        assert!(text.contains("($625,000 average per grant)"));
        assert!(text.contains("**2 R01 grants** (50%)"));
        assert!(text.contains("**1 P30/P50 center grants**"));
    }

    #[test]
    fn test_patch_replaces_existing_section() {
        let content = "# Title\n\n## Key Statistics\n- old\n\n## Methods\nbody\n";
        let patched = patch_readme(content, "## Key Statistics\n- new").unwrap();
        assert_eq!(patched, "# Title\n\n## Key Statistics\n- new\n\n## Methods\nbody\n");
    }

    #[test]
    fn test_patch_replaces_until_end_of_file() {
        let content = "# Title\n\n## Key Statistics\n- old\n";
        let patched = patch_readme(content, "## Key Statistics\n- new").unwrap();
        assert_eq!(patched, "# Title\n\n## Key Statistics\n- new\n\n");
    }

    #[test]
    fn test_patch_inserts_before_recommendations() {
        let content = "# Title\n\n## Target Recommendations\n- a\n";
        let patched = patch_readme(content, "## Key Statistics\n- new").unwrap();
        assert_eq!(
            patched,
            "# Title\n\n## Key Statistics\n- new\n\n## Target Recommendations\n- a\n"
        );
    }

    #[test]
    fn test_patch_without_anchor() {
        assert!(patch_readme("# Title\n\n## Other\n", "## Key Statistics").is_none());
    }

    #[test]
    fn test_update_readme_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("README.md");
        std::fs::write(&path, "# Title\n\n## Key Statistics\n- old\n").unwrap();

        let result = update_readme(&path, &sample_stats()).unwrap();

        assert_eq!(result, ReadmeUpdate::Updated);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("**4 hiring-relevant grants**"));
        assert!(!content.contains("- old"));
    }

    #[test]
    fn test_update_missing_readme() {
        let dir = tempfile::tempdir().unwrap();
        let result = update_readme(&dir.path().join("README.md"), &sample_stats()).unwrap();
        assert_eq!(result, ReadmeUpdate::Missing);
    }
}
