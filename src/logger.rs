//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志输出
///
/// 默认 info 级别，可通过 RUST_LOG 覆盖；重复调用只有第一次生效
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();
}
