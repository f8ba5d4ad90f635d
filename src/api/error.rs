// ==========================================
// 预测情景模拟 - API层错误类型
// ==========================================
// 职责: 外部预测服务调用错误, 把 HTTP 状态转换为用户可读的消息
// ==========================================

use crate::engine::orchestrator::SimulationFailure;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 传输层失败的错误码
pub const NETWORK_ERROR_CODE: &str = "NETWORK_ERROR";
/// 请求超时的错误码
pub const TIMEOUT_CODE: &str = "TIMEOUT";

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 传输错误
    // ==========================================
    #[error("Network error. Please check your connection. ({0})")]
    Network(String),

    #[error("请求超时: {0}")]
    Timeout(String),

    // ==========================================
    // 服务端错误
    // ==========================================
    #[error("{message} (status={status}, code={code})")]
    Http {
        status: u16,
        code: String,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("响应解析失败: {0}")]
    Decode(String),

    // ==========================================
    // 调用方错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// API层结果类型
pub type ApiResult<T> = Result<T, ApiError>;

/// 服务端错误响应体
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// 由 HTTP 状态与响应体构造错误
    ///
    /// # 规则
    /// - 400 / 429: 优先使用服务端 message
    /// - 403 / 404 / 500 / 502 / 503: 固定文案
    /// - 其他状态: 服务端 message, 否则通用文案
    /// - code 缺省为 HTTP_{status}
    pub fn from_status(status: u16, body: ErrorBody) -> Self {
        let server_message = body.message.clone();
        let message = match status {
            400 => server_message.unwrap_or_else(|| "Invalid request".to_string()),
            403 => "You do not have permission to perform this action".to_string(),
            404 => "The requested resource was not found".to_string(),
            429 => server_message
                .unwrap_or_else(|| "Too many requests. Please wait and try again.".to_string()),
            500 => "Server error. Please try again later.".to_string(),
            502 | 503 => "Service temporarily unavailable".to_string(),
            _ => server_message.unwrap_or_else(|| "An unexpected error occurred".to_string()),
        };

        ApiError::Http {
            status,
            code: body.code.unwrap_or_else(|| format!("HTTP_{}", status)),
            message,
            details: body.details,
        }
    }

    /// HTTP 状态（传输错误为 0）
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Http { status, .. } => *status,
            _ => 0,
        }
    }

    /// 错误码
    pub fn code(&self) -> String {
        match self {
            ApiError::Network(_) => NETWORK_ERROR_CODE.to_string(),
            ApiError::Timeout(_) => TIMEOUT_CODE.to_string(),
            ApiError::Http { code, .. } => code.clone(),
            ApiError::Decode(_) => "DECODE_ERROR".to_string(),
            ApiError::InvalidInput(_) => "INVALID_INPUT".to_string(),
            ApiError::Internal(_) | ApiError::Other(_) => "INTERNAL_ERROR".to_string(),
        }
    }

    /// 展示给用户的消息
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => "Network error. Please check your connection.".to_string(),
            ApiError::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

// ==========================================
// 转换为编排器失败
// ==========================================
impl From<ApiError> for SimulationFailure {
    fn from(err: ApiError) -> Self {
        SimulationFailure::new(err.user_message(), err.code())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::from_status(status.as_u16(), ErrorBody::default())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}
