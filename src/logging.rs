//! ログ初期化
//!
//! `RUST_LOG` があればそれを優先し、なければ設定の log_level を使う。
//! `--verbose` 指定時は debug を強制する。

use tracing_subscriber::EnvFilter;

pub fn init(level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
