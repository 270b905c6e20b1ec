use anyhow::Context;
use clap::Parser;
use grant_scout::api::ReporterClient;
use grant_scout::error::GrantScoutError;
use grant_scout::grants::GrantOptions;
use grant_scout::progress::{ConsoleObserver, ProgressObserver, SilentObserver};
use grant_scout::readme::{self, ReadmeUpdate};
use grant_scout::{cli, config, finder, grants, logging, tabular};
use grant_scout_common::{format_thousands, GrantStats};
use cli::{Cli, Commands};
use config::Config;
use std::time::Duration;

/// 集計表示で出す種目数
const TOP_ACTIVITY_CODES: usize = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::configure_logging(cli.verbose, cli.quiet);
    let config = Config::load().context("設定ファイルの読み込みに失敗しました")?;

    let console = ConsoleObserver::new();
    let observer: &dyn ProgressObserver = if cli.quiet { &SilentObserver } else { &console };

    match cli.command {
        Commands::Abstracts {
            input,
            output,
            format,
            threshold,
            title_weight,
            name_weight,
            delay_ms,
        } => {
            let mut config = config;
            if let Some(threshold) = threshold {
                config.scoring.threshold = threshold;
            }
            if let Some(weight) = title_weight {
                config.scoring.title_weight = weight;
            }
            if let Some(weight) = name_weight {
                config.scoring.name_weight = weight;
            }
            if let Some(delay) = delay_ms {
                config.search_delay_ms = delay;
            }
            config.validate()?;

            println!("🔎 grant-scout - 抄録照合\n");

            let targets = match tabular::read_targets(&input) {
                Ok(targets) => targets,
                Err(e @ GrantScoutError::FileNotFound(_)) => {
                    println!("✗ {}", e);
                    return Ok(());
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("照合対象を読み込めません: {}", input.display()))
                }
            };
            observer.targets_loaded(targets.len());

            let client = ReporterClient::new(
                config.api_url.clone(),
                Duration::from_millis(config.search_delay_ms),
            )?;
            let run = finder::fetch_abstracts(&client, &targets, &config, observer).await;

            let paths = tabular::write_table(&run.rows, &format, &output, "abstracts")?;
            for path in &paths {
                println!("✔ 保存しました: {}", path.display());
            }

            println!("\n✅ 抄録照合完了");
        }

        Commands::Grants {
            output,
            format,
            min_years_remaining,
            no_dedupe,
            no_readme,
            include_subprojects,
            readme: readme_path,
            delay_ms,
        } => {
            let mut config = config;
            if let Some(years) = min_years_remaining {
                config.timing.min_years_remaining = years;
            }
            if include_subprojects {
                config.exclude_subprojects = false;
            }
            if let Some(path) = readme_path {
                config.readme_path = path;
            }
            if let Some(delay) = delay_ms {
                config.bulk_delay_ms = delay;
            }
            config.validate()?;

            println!("📊 grant-scout - グラント一括取得\n");
            println!("機関: {}", config.exact_org_names.join(", "));
            println!(
                "年度: {}",
                config
                    .fiscal_years
                    .iter()
                    .map(|fy| fy.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            println!("種目: {}\n", config.gold_tier_codes.join(", "));

            let client = ReporterClient::new(
                config.api_url.clone(),
                Duration::from_millis(config.bulk_delay_ms),
            )?;
            let options = GrantOptions {
                today: chrono::Local::now().date_naive(),
                dedupe: !no_dedupe,
            };
            let run = grants::collect_grants(&client, &config, &options, observer).await;

            if run.fetched == 0 {
                println!("✗ プロジェクトが見つかりませんでした");
                return Ok(());
            }

            let paths = tabular::write_table(&run.rows, &format, &output, "grants")?;
            for path in &paths {
                println!("✔ {}件を保存しました: {}", run.rows.len(), path.display());
            }

            if let Some(stats) = GrantStats::from_rows(&run.rows) {
                if !cli.quiet {
                    print_stats(&stats);
                }

                if !no_readme {
                    match readme::update_readme(&config.readme_path, &stats)? {
                        ReadmeUpdate::Updated => {
                            println!("✔ {} の集計を更新しました", config.readme_path.display())
                        }
                        ReadmeUpdate::Unchanged => println!(
                            "⚠ {} に集計セクションの挿入位置がありません",
                            config.readme_path.display()
                        ),
                        ReadmeUpdate::Missing => println!(
                            "⚠ {} が見つからないため更新をスキップしました",
                            config.readme_path.display()
                        ),
                    }
                }
            }

            println!("\n✅ 採用関連グラント {}件", run.rows.len());
        }

        Commands::Config { show, reset } => {
            let mut config = config;

            if reset {
                config = Config::default();
                config.save()?;
                println!("✔ 設定を初期化しました: {}", Config::config_path()?.display());
            }

            if show || !reset {
                println!("設定: {}", Config::config_path()?.display());
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

fn print_stats(stats: &GrantStats) {
    println!("\nグラント集計:");
    println!("  採用関連グラント: {}件", stats.total_grants);

    println!("\n種目:");
    for (activity, count) in stats.top_activity_codes(TOP_ACTIVITY_CODES) {
        println!("  {:4}: {:3}件", activity, count);
    }

    println!("\n年度:");
    for (fy, count) in &stats.fiscal_year_counts {
        println!("  FY{}: {:3}件", fy, count);
    }

    if stats.total_funding > 0.0 {
        println!(
            "\n助成額: 総額 ${}、平均 ${}",
            format_thousands(stats.total_funding),
            format_thousands(stats.avg_funding)
        );
    }
}
