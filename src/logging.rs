use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// ログは標準エラーへ。`--debug` 指定時は `RUST_LOG` より優先してdebugにする。
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::new("godep_scout=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("godep_scout=info"))
    };

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init();
}
