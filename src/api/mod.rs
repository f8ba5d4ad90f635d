// ==========================================
// 预测情景模拟 - API 层
// ==========================================
// 职责: 外部预测服务的调用契约与 HTTP 实现
// ==========================================

pub mod dto;
pub mod error;
pub mod forecast_service;
pub mod http_client;

// 重导出核心类型
pub use dto::{ExportRequest, ExportResponse};
pub use error::{ApiError, ApiResult, ErrorBody};
pub use forecast_service::ForecastService;
pub use http_client::{generate_request_id, HttpForecastService, REQUEST_ID_HEADER};
