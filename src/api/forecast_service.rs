// ==========================================
// 预测情景模拟 - 外部预测服务接口
// ==========================================
// 职责: 定义外部模拟服务的调用契约
// 说明: 数值计算完全由服务完成, 本 crate 视其为黑盒
// ==========================================

use crate::api::dto::{ExportRequest, ExportResponse};
use crate::api::error::ApiResult;
use crate::domain::series::{ProductCatalog, ProductData};
use crate::domain::simulation::{SimulationRequest, SimulationResult};
use async_trait::async_trait;

/// 外部预测服务
///
/// # 实现
/// - `HttpForecastService`: reqwest 实现
/// - 测试中以内存实现替代
#[async_trait]
pub trait ForecastService: Send + Sync {
    /// GET forecast/products
    async fn get_products(&self) -> ApiResult<ProductCatalog>;

    /// GET forecast/data/{product}?aps_class=
    ///
    /// # 参数
    /// - aps_class: None 表示产品合计
    async fn get_product_data(&self, product: &str, aps_class: Option<&str>) -> ApiResult<ProductData>;

    /// POST forecast/simulate
    async fn simulate(&self, request: &SimulationRequest) -> ApiResult<SimulationResult>;

    /// POST forecast/export（服务端生成 CSV）
    async fn export(&self, request: &ExportRequest) -> ApiResult<ExportResponse>;
}
