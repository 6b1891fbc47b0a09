use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// ログ出力を初期化（RUST_LOG があればそれを優先）
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "warn,lesson_lens=debug,lesson_lens_common=debug"
    } else {
        "warn"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(verbose).with_writer(std::io::stderr))
        .try_init();
}
