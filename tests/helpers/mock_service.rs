// ==========================================
// Mock 预测服务 - 用于集成测试
// ==========================================
// 组合契约: simulated[m] = baseline[m] × Π(锁定事件乘数) × 市场份额乘数
// 市场份额乘数: relative 模式为 1 + delta/100, 其他模式为 1.0
// ==========================================

use async_trait::async_trait;
use forecast_scenario::api::{ApiError, ApiResult, ErrorBody, ExportRequest, ExportResponse, ForecastService};
use forecast_scenario::domain::simulation::{AppliedFactor, ExceededMonth};
use forecast_scenario::domain::{
    EventCategory, MarketShareMode, MonthlySeries, ProductCatalog, ProductData, SimulationRequest,
    SimulationResult,
};
use forecast_scenario::engine::{export_filename, to_csv, to_export_rows, ExportContext};
use forecast_scenario::Month;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// 超过基线该比例的月份标记为需复核
pub const REVIEW_RATIO: f64 = 1.2;

/// 按组合契约计算模拟结果（纯函数）
pub fn compose(request: &SimulationRequest) -> SimulationResult {
    let ms = match request.params.ms_mode {
        MarketShareMode::Relative => 1.0 + request.params.ms_params.delta.unwrap_or(0.0) / 100.0,
        _ => 1.0,
    };

    let mut simulated = Vec::with_capacity(12);
    let mut final_multipliers = BTreeMap::new();
    let mut applied_details = BTreeMap::new();
    let mut ms_adjustments = BTreeMap::new();
    let mut exceeded_months = Vec::new();

    for month in Month::ALL {
        let mut factors = Vec::new();
        let mut event_mult = 1.0;
        for category in EventCategory::ALL {
            for event in request.locked_events.events(category) {
                if event.month == month {
                    event_mult *= event.multiplier;
                    factors.push(AppliedFactor(category.locked_label().to_string(), event.multiplier));
                }
            }
        }
        if ms != 1.0 {
            factors.push(AppliedFactor("MS_Relative".to_string(), ms));
        }

        let value = request.baseline_vals.get(month).map(|b| b * event_mult * ms);
        if let (Some(sim), Some(base)) = (value, request.baseline_vals.get(month)) {
            if sim > base * REVIEW_RATIO {
                exceeded_months.push(ExceededMonth {
                    month,
                    simulated: Some(sim),
                    baseline: Some(base),
                    threshold: Some(base * REVIEW_RATIO),
                    reason: None,
                });
            }
        }

        simulated.push(value);
        final_multipliers.insert(month, event_mult);
        applied_details.insert(month, factors);
        ms_adjustments.insert(month, ms);
    }

    SimulationResult {
        simulated: MonthlySeries::new(simulated),
        final_multipliers,
        applied_details,
        ms_adjustments,
        exceeded_months,
    }
}

// ==========================================
// MockForecastService
// ==========================================
#[derive(Default)]
pub struct MockForecastService {
    catalog: ProductCatalog,
    data: HashMap<(String, Option<String>), ProductData>,
    /// 每次 simulate 依次取一个延时, 取空后为 0
    delays: Mutex<VecDeque<Duration>>,
    /// 每次 simulate 依次取一个是否失败, 取空后为成功
    failures: Mutex<VecDeque<bool>>,
    requests: Mutex<Vec<SimulationRequest>>,
    simulate_calls: AtomicUsize,
    data_calls: AtomicUsize,
}

impl MockForecastService {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册产品数据（aps_class 为 None 表示产品合计）
    pub fn with_product(mut self, product: &str, aps_class: Option<&str>, data: ProductData) -> Self {
        if !self.catalog.products.iter().any(|p| p == product) {
            self.catalog.products.push(product.to_string());
        }
        if let Some(class) = aps_class {
            self.catalog
                .aps_classes
                .entry(product.to_string())
                .or_default()
                .push(class.to_string());
        }
        self.data
            .insert((product.to_string(), aps_class.map(str::to_string)), data);
        self
    }

    pub fn push_delay(&self, delay: Duration) {
        self.delays.lock().unwrap().push_back(delay);
    }

    pub fn fail_next(&self) {
        self.failures.lock().unwrap().push_back(true);
    }

    pub fn simulate_calls(&self) -> usize {
        self.simulate_calls.load(Ordering::SeqCst)
    }

    pub fn data_calls(&self) -> usize {
        self.data_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<SimulationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ForecastService for MockForecastService {
    async fn get_products(&self) -> ApiResult<ProductCatalog> {
        Ok(self.catalog.clone())
    }

    async fn get_product_data(&self, product: &str, aps_class: Option<&str>) -> ApiResult<ProductData> {
        self.data_calls.fetch_add(1, Ordering::SeqCst);
        self.data
            .get(&(product.to_string(), aps_class.map(str::to_string)))
            .cloned()
            .ok_or_else(|| ApiError::from_status(404, ErrorBody::default()))
    }

    async fn simulate(&self, request: &SimulationRequest) -> ApiResult<SimulationResult> {
        self.simulate_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let delay = self.delays.lock().unwrap().pop_front();
        let fail = self.failures.lock().unwrap().pop_front().unwrap_or(false);

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(ApiError::from_status(503, ErrorBody::default()));
        }
        Ok(compose(request))
    }

    async fn export(&self, request: &ExportRequest) -> ApiResult<ExportResponse> {
        let ctx = ExportContext {
            product: &request.product,
            aps_class: request.aps_class.as_deref(),
            year: request.year,
            ms_mode: request.ms_mode,
        };
        let result = SimulationResult {
            simulated: request.simulated.clone(),
            final_multipliers: request.multipliers.clone(),
            applied_details: request.applied_details.clone(),
            ms_adjustments: request.ms_adjustments.clone(),
            exceeded_months: Vec::new(),
        };
        let rows = to_export_rows(&ctx, &result, &request.baseline);
        Ok(ExportResponse {
            csv_content: to_csv(&rows).map_err(|e| ApiError::Internal(e.to_string()))?,
            filename: export_filename(&request.product, request.aps_class.as_deref(), request.year),
        })
    }
}
