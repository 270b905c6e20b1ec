use std::io;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// 既定のフィルタ（RUST_LOG が設定されていればそちらを優先）
fn default_filter(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "debug,api_request=debug,reqwest=info,hyper=warn"
    } else if quiet {
        "error"
    } else {
        "warn,api_request=warn"
    }
}

/// ログ出力は stderr（標準出力は進捗表示に使う）
pub fn configure_logging(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose, quiet)));

    let stderr_log = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_filter(filter);

    // テストなどで二重に初期化された場合は無視
    let _ = tracing_subscriber::Registry::default()
        .with(stderr_log)
        .try_init();
}
