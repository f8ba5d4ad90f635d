// ==========================================
// 预测情景模拟 - HTTP 预测服务客户端
// ==========================================
// 职责: 以 reqwest 实现 ForecastService
// 说明: 每个请求携带 X-Request-ID; 非 2xx 状态按统一规则映射为 ApiError
// ==========================================

use crate::api::dto::{ExportRequest, ExportResponse};
use crate::api::error::{ApiError, ApiResult, ErrorBody};
use crate::api::forecast_service::ForecastService;
use crate::config::ServiceConfig;
use crate::domain::series::{ProductCatalog, ProductData};
use crate::domain::simulation::{SimulationRequest, SimulationResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// 请求追踪头
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// 生成请求 ID: {毫秒时间戳}-{9 位随机后缀}
pub fn generate_request_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", millis, &suffix[..9])
}

// ==========================================
// HttpForecastService
// ==========================================
#[derive(Debug, Clone)]
pub struct HttpForecastService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpForecastService {
    /// 创建客户端
    ///
    /// # 参数
    /// - config: 服务配置（基础 URL、超时）
    pub fn new(config: &ServiceConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Internal(format!("HTTP 客户端初始化失败: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// 发送请求并解析 JSON
    async fn execute<T: DeserializeOwned>(&self, builder: reqwest::RequestBuilder, path: &str) -> ApiResult<T> {
        let request_id = generate_request_id();
        debug!(path, request_id = %request_id, "发送预测服务请求");

        let response = builder
            .header(REQUEST_ID_HEADER, &request_id)
            .send()
            .await
            .map_err(|e| {
                warn!(path, request_id = %request_id, error = %e, "预测服务请求未送达");
                ApiError::from(e)
            })?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            // 错误体解析失败时按空体处理
            let body: ErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
            let err = ApiError::from_status(status.as_u16(), body);
            warn!(path, request_id = %request_id, status = status.as_u16(), code = %err.code(), "预测服务返回错误");
            return Err(err);
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    fn class_query(aps_class: Option<&str>) -> Vec<(&'static str, String)> {
        aps_class
            .map(|class| vec![("aps_class", class.to_string())])
            .unwrap_or_default()
    }
}

#[async_trait]
impl ForecastService for HttpForecastService {
    async fn get_products(&self) -> ApiResult<ProductCatalog> {
        let path = "forecast/products";
        self.execute(self.client.get(self.url(path)), path).await
    }

    async fn get_product_data(&self, product: &str, aps_class: Option<&str>) -> ApiResult<ProductData> {
        if product.trim().is_empty() {
            return Err(ApiError::InvalidInput("产品代码不能为空".to_string()));
        }
        let path = format!("forecast/data/{}", product);
        let builder = self
            .client
            .get(self.url(&path))
            .query(&Self::class_query(aps_class));
        self.execute(builder, &path).await
    }

    async fn simulate(&self, request: &SimulationRequest) -> ApiResult<SimulationResult> {
        let path = "forecast/simulate";
        self.execute(self.client.post(self.url(path)).json(request), path).await
    }

    async fn export(&self, request: &ExportRequest) -> ApiResult<ExportResponse> {
        let path = "forecast/export";
        self.execute(self.client.post(self.url(path)).json(request), path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BuildEnvironment, ServiceConfig};

    #[test]
    fn test_request_id_format() {
        let id = generate_request_id();
        let (millis, suffix) = id.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 9);
        assert_ne!(generate_request_id(), id);
    }

    #[test]
    fn test_url_joining() {
        let config = ServiceConfig {
            base_url: "https://forecast.example.com/api/".to_string(),
            ..ServiceConfig::for_environment(BuildEnvironment::Production)
        };
        let service = HttpForecastService::new(&config).unwrap();
        assert_eq!(service.base_url(), "https://forecast.example.com/api");
        assert_eq!(
            service.url("/forecast/products"),
            "https://forecast.example.com/api/forecast/products"
        );
    }

    #[test]
    fn test_class_query() {
        assert!(HttpForecastService::class_query(None).is_empty());
        assert_eq!(
            HttpForecastService::class_query(Some("ACNF")),
            vec![("aps_class", "ACNF".to_string())]
        );
    }
}
