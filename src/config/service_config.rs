// ==========================================
// 预测情景模拟 - 服务配置
// ==========================================
// 职责: 外部服务基础 URL、超时、防抖延时、锁定事件作用域
// 来源: 环境变量（from_env）或任意键值查找（from_lookup, 便于测试）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    pub const ENVIRONMENT: &str = "FORECAST_ENV";
    pub const API_URL: &str = "FORECAST_API_URL";
    pub const REQUEST_TIMEOUT_MS: &str = "FORECAST_REQUEST_TIMEOUT_MS";
    pub const DEBOUNCE_MS: &str = "FORECAST_DEBOUNCE_MS";
    pub const LOCKED_EVENT_SCOPE: &str = "FORECAST_LOCKED_EVENT_SCOPE";
}

/// 开发环境默认服务地址
pub const DEV_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(150);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("配置值无效: key={key}, value={value}, reason={reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("生产环境必须设置 {0}")]
    MissingValue(String),
}

// ==========================================
// 构建环境
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildEnvironment {
    Development,
    Production,
}

impl BuildEnvironment {
    /// 未配置时: debug 构建为开发, release 构建为生产
    pub fn compiled_default() -> Self {
        if cfg!(debug_assertions) {
            BuildEnvironment::Development
        } else {
            BuildEnvironment::Production
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildEnvironment::Development => "development",
            BuildEnvironment::Production => "production",
        }
    }
}

impl fmt::Display for BuildEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BuildEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(BuildEnvironment::Development),
            "production" | "prod" => Ok(BuildEnvironment::Production),
            other => Err(format!("未知构建环境: {}", other)),
        }
    }
}

// ==========================================
// 锁定事件作用域
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockedEventScope {
    /// 切换产品时清空锁定事件（类别/年份切换保留）
    #[default]
    ResetOnProductChange,
    /// 在整个会话内保留
    Persist,
}

impl LockedEventScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockedEventScope::ResetOnProductChange => "reset_on_product_change",
            LockedEventScope::Persist => "persist",
        }
    }
}

impl std::str::FromStr for LockedEventScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reset_on_product_change" | "reset" => Ok(LockedEventScope::ResetOnProductChange),
            "persist" => Ok(LockedEventScope::Persist),
            other => Err(format!("未知锁定事件作用域: {}", other)),
        }
    }
}

// ==========================================
// ServiceConfig
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub environment: BuildEnvironment,
    pub base_url: String,
    pub request_timeout: Duration,
    pub debounce_delay: Duration,
    pub locked_event_scope: LockedEventScope,
}

impl ServiceConfig {
    /// 某环境的默认配置
    pub fn for_environment(environment: BuildEnvironment) -> Self {
        Self {
            environment,
            base_url: DEV_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            debounce_delay: DEFAULT_DEBOUNCE_DELAY,
            locked_event_scope: LockedEventScope::default(),
        }
    }

    /// 从进程环境变量读取
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值查找读取
    ///
    /// # 规则
    /// - 生产环境: FORECAST_API_URL 必填, 自动补齐 /api 后缀
    /// - 开发环境: 优先 FORECAST_API_URL, 否则 http://localhost:5000/api
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = match read(config_keys::ENVIRONMENT) {
            Some(raw) => raw
                .parse::<BuildEnvironment>()
                .map_err(|reason| invalid(config_keys::ENVIRONMENT, &raw, reason))?,
            None => BuildEnvironment::compiled_default(),
        };

        // HTTP 客户端无法解析相对地址, 必须为绝对 URL
        let api_url = read(config_keys::API_URL)
            .map(|url| require_absolute(config_keys::API_URL, url))
            .transpose()?;

        let base_url = match (environment, api_url) {
            (BuildEnvironment::Production, Some(url)) => ensure_api_suffix(&url),
            (BuildEnvironment::Production, None) => {
                return Err(ConfigError::MissingValue(config_keys::API_URL.to_string()))
            }
            (BuildEnvironment::Development, Some(url)) => url,
            (BuildEnvironment::Development, None) => DEV_BASE_URL.to_string(),
        };

        let request_timeout = read_millis(&read, config_keys::REQUEST_TIMEOUT_MS)?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let debounce_delay =
            read_millis(&read, config_keys::DEBOUNCE_MS)?.unwrap_or(DEFAULT_DEBOUNCE_DELAY);

        let locked_event_scope = match read(config_keys::LOCKED_EVENT_SCOPE) {
            Some(raw) => raw
                .parse::<LockedEventScope>()
                .map_err(|reason| invalid(config_keys::LOCKED_EVENT_SCOPE, &raw, reason))?,
            None => LockedEventScope::default(),
        };

        Ok(Self {
            environment,
            base_url,
            request_timeout,
            debounce_delay,
            locked_event_scope,
        })
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::for_environment(BuildEnvironment::Development)
    }
}

/// 保证以 /api 结尾
pub fn ensure_api_suffix(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    if trimmed.ends_with("/api") {
        trimmed.to_string()
    } else {
        format!("{}/api", trimmed)
    }
}

fn require_absolute(key: &str, url: String) -> Result<String, ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url)
    } else {
        Err(invalid(key, &url, "需要 http:// 或 https:// 开头的绝对地址".to_string()))
    }
}

fn invalid(key: &str, value: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    }
}

fn read_millis<F>(read: &F, key: &str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match read(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|e| invalid(key, &raw, e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_development_defaults() {
        let config = ServiceConfig::from_lookup(lookup_from(&[("FORECAST_ENV", "development")])).unwrap();
        assert_eq!(config.base_url, "http://localhost:5000/api");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.debounce_delay, Duration::from_millis(150));
        assert_eq!(config.locked_event_scope, LockedEventScope::ResetOnProductChange);
    }

    #[test]
    fn test_production_url_gets_api_suffix() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("FORECAST_ENV", "production"),
            ("FORECAST_API_URL", "https://forecast.example.com/"),
            ("FORECAST_DEBOUNCE_MS", "200"),
            ("FORECAST_LOCKED_EVENT_SCOPE", "persist"),
        ]))
        .unwrap();
        assert_eq!(config.environment, BuildEnvironment::Production);
        assert_eq!(config.base_url, "https://forecast.example.com/api");
        assert_eq!(config.debounce_delay, Duration::from_millis(200));
        assert_eq!(config.locked_event_scope, LockedEventScope::Persist);

        assert_eq!(ensure_api_suffix("https://x.io/api"), "https://x.io/api");
    }

    #[test]
    fn test_production_requires_url() {
        let result = ServiceConfig::from_lookup(lookup_from(&[("FORECAST_ENV", "prod")]));
        assert_eq!(
            result,
            Err(ConfigError::MissingValue("FORECAST_API_URL".to_string()))
        );
    }

    #[test]
    fn test_relative_api_url_rejected() {
        for env in ["production", "development"] {
            let result = ServiceConfig::from_lookup(lookup_from(&[
                ("FORECAST_ENV", env),
                ("FORECAST_API_URL", "/api"),
            ]));
            match result {
                Err(ConfigError::InvalidValue { key, value, .. }) => {
                    assert_eq!(key, "FORECAST_API_URL");
                    assert_eq!(value, "/api");
                }
                other => panic!("Expected InvalidValue, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = ServiceConfig::from_lookup(lookup_from(&[
            ("FORECAST_ENV", "dev"),
            ("FORECAST_REQUEST_TIMEOUT_MS", "soon"),
        ]));
        match result {
            Err(ConfigError::InvalidValue { key, .. }) => {
                assert_eq!(key, "FORECAST_REQUEST_TIMEOUT_MS")
            }
            _ => panic!("Expected InvalidValue"),
        }

        let result = ServiceConfig::from_lookup(lookup_from(&[("FORECAST_ENV", "staging")]));
        assert!(result.is_err());
    }
}
