// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支持环境变量配置日志级别与 JSON 输出
// ==========================================

use std::error::Error;
use tracing_subscriber::{fmt, EnvFilter};

/// 日志输出格式环境变量（text | json）
pub const LOG_FORMAT_ENV: &str = "FORECAST_LOG_FORMAT";

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=debug 或 RUST_LOG=forecast_scenario::engine=trace
/// - FORECAST_LOG_FORMAT: json 时输出结构化 JSON
///
/// # 返回
/// - Err: 全局订阅者已存在或注册失败
///
/// # 示例
/// ```no_run
/// use forecast_scenario::logging;
/// logging::init().expect("日志系统初始化失败");
/// ```
pub fn init() -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true);

    if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_reports_error() {
        init_test();
        // 全局订阅者已注册, 再次初始化必须报错而不是静默忽略
        assert!(init().is_err());
    }
}
