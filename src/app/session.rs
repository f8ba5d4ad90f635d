// ==========================================
// 预测情景模拟 - 情景会话
// ==========================================
// 职责: 显式构造的会话对象, 持有选择、已加载数据、两类仓与编排器
// 说明: 所有变更经由本对象的方法进入; 会返回防抖 token 的方法
//       表示输入已变化, 由运行时负责在延时后调用 on_timer_fired
// 红线: 不暴露仓的可变引用
// ==========================================

use crate::api::dto::{ExportRequest, ExportResponse};
use crate::api::error::ApiError;
use crate::api::forecast_service::ForecastService;
use crate::config::{LockedEventScope, ServiceConfig};
use crate::domain::event::{LockedEvent, LockedEventSet};
use crate::domain::selection::{clean_aps_class, Selection, SelectionKey};
use crate::domain::series::{MonthlySeries, ProductCatalog, ProductData};
use crate::domain::simulation::SimulationResult;
use crate::domain::types::{EventCategory, Month};
use crate::engine::debounce::DebounceToken;
use crate::engine::events::OptionalEventPublisher;
use crate::engine::fixed_domain::{compute_domain, FixedDomain, FixedDomainCache};
use crate::engine::locked_events::{ClearScope, LockError, LockedEventAction, LockedEventStore};
use crate::engine::orchestrator::{
    OrchestratorView, ResponseOutcome, SimulationInputs, SimulationOrchestrator, TimerOutcome,
};
use crate::engine::scenario_params::{ParameterPatch, ScenarioParameterStore, ScenarioSnapshot};
use crate::engine::summary::{
    export_filename, summarize, to_csv, to_export_rows, ExportContext, ExportError, ExportRow,
    SummaryStats,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

// ==========================================
// 错误类型
// ==========================================

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("未选择月份: category={0}")]
    NoMonthSelected(EventCategory),

    #[error("未选择产品")]
    NoProductSelected,

    #[error("没有可导出的模拟结果")]
    NothingToExport,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("会话运行时已关闭")]
    RuntimeClosed,
}

pub type SessionResult<T> = Result<T, SessionError>;

// ==========================================
// WarningBanner - 复核提示
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarningBanner {
    enabled: bool,
    dismissed: bool,
}

impl WarningBanner {
    pub fn new() -> Self {
        Self {
            enabled: true,
            dismissed: false,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }

    /// 新结果被接受时调用
    pub fn reset_dismissal(&mut self) {
        self.dismissed = false;
    }

    pub fn is_visible(&self, result: Option<&SimulationResult>) -> bool {
        self.enabled
            && !self.dismissed
            && result.map(|r| !r.exceeded_months.is_empty()).unwrap_or(false)
    }
}

impl Default for WarningBanner {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 视图与导出文件
// ==========================================

/// 会话快照（供观察方渲染）
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub selection: Selection,
    pub simulation: OrchestratorView,
    pub locked_events: Arc<LockedEventSet>,
    pub params: ScenarioSnapshot,
    pub summary: Option<SummaryStats>,
    pub fixed_domain: FixedDomain,
    pub warnings_visible: bool,
    pub needs_update: bool,
    pub load_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub content: String,
}

/// 已加载的数据, 标记其所属的产品与类别
#[derive(Debug, Clone)]
struct LoadedData {
    product: String,
    aps_class: Option<String>,
    data: ProductData,
}

impl LoadedData {
    fn matches(&self, key: &SelectionKey) -> bool {
        self.product == key.product && self.aps_class == key.aps_class
    }
}

fn values_of(series: Option<&MonthlySeries>) -> &[Option<f64>] {
    series.map(|s| s.as_slice()).unwrap_or(&[])
}

// ==========================================
// ScenarioSession
// ==========================================
pub struct ScenarioSession<S: ForecastService> {
    service: Arc<S>,
    config: ServiceConfig,
    catalog: ProductCatalog,
    selection: Selection,
    loaded: Option<LoadedData>,
    load_error: Option<String>,
    locked: LockedEventStore,
    params: ScenarioParameterStore,
    orchestrator: SimulationOrchestrator,
    domains: FixedDomainCache,
    warnings: WarningBanner,
}

impl<S: ForecastService> ScenarioSession<S> {
    /// 创建会话
    ///
    /// # 参数
    /// - service: 外部预测服务
    /// - config: 服务配置（防抖延时、锁定事件作用域）
    /// - publisher: 编排器事件通知
    pub fn new(service: Arc<S>, config: ServiceConfig, publisher: OptionalEventPublisher) -> Self {
        let orchestrator = SimulationOrchestrator::new(config.debounce_delay, publisher);
        info!(
            environment = %config.environment,
            base_url = %config.base_url,
            locked_event_scope = config.locked_event_scope.as_str(),
            "情景会话已创建"
        );
        Self {
            service,
            config,
            catalog: ProductCatalog::default(),
            selection: Selection::default(),
            loaded: None,
            load_error: None,
            locked: LockedEventStore::new(),
            params: ScenarioParameterStore::new(),
            orchestrator,
            domains: FixedDomainCache::new(),
            warnings: WarningBanner::new(),
        }
    }

    // ==========================================
    // 只读访问
    // ==========================================

    pub fn service(&self) -> Arc<S> {
        Arc::clone(&self.service)
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn locked_events(&self) -> &LockedEventStore {
        &self.locked
    }

    pub fn params(&self) -> &ScenarioParameterStore {
        &self.params
    }

    pub fn orchestrator(&self) -> &SimulationOrchestrator {
        &self.orchestrator
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// 当前选择对应的已加载数据
    pub fn product_data(&self) -> Option<&ProductData> {
        let key = self.selection.key()?;
        self.loaded.as_ref().filter(|l| l.matches(&key)).map(|l| &l.data)
    }

    pub fn current_baseline(&self) -> Option<&MonthlySeries> {
        let year = self.selection.year?;
        self.product_data()?.baseline_for(year)
    }

    pub fn display_result(&self) -> Option<&SimulationResult> {
        self.orchestrator.display_result().map(|r| r.as_ref())
    }

    pub fn available_months(&self, category: EventCategory) -> Vec<Month> {
        self.locked
            .available_months(category, &self.params.params().toggle_settings)
    }

    // ==========================================
    // 选择生命周期
    // ==========================================

    /// 加载产品目录; 尚未选择产品时选中第一个
    pub async fn load_products(&mut self) -> SessionResult<Option<DebounceToken>> {
        let catalog = self.service.get_products().await.map_err(|e| {
            self.load_error = Some(e.user_message());
            e
        })?;
        info!(products = catalog.products.len(), "产品目录已加载");
        let first = catalog.products.first().cloned();
        self.catalog = catalog;

        match (self.selection.product.is_none(), first) {
            (true, Some(product)) => self.select_product(&product).await,
            _ => Ok(None),
        }
    }

    /// 切换产品: 复位类别、年份、已加载数据、结果与固定区间
    ///
    /// # 返回
    /// - None: 产品未变化
    pub async fn select_product(&mut self, product: &str) -> SessionResult<Option<DebounceToken>> {
        if !self.selection.switch_product(product) {
            return Ok(None);
        }
        info!(product, "切换产品");

        self.loaded = None;
        self.domains.invalidate();
        self.orchestrator.reset();
        if self.config.locked_event_scope == LockedEventScope::ResetOnProductChange {
            self.locked.clear(ClearScope::All);
        }

        if let Err(e) = self.load_product_data().await {
            warn!(product, error = %e, "产品数据加载失败");
        }
        Ok(Some(self.orchestrator.input_changed()))
    }

    /// 切换 APS 类别并重新加载数据; 旧选择的结果不再展示或导出
    pub async fn select_class(&mut self, aps_class: Option<&str>) -> SessionResult<Option<DebounceToken>> {
        let cleaned = clean_aps_class(aps_class);
        if cleaned == self.selection.aps_class {
            return Ok(None);
        }
        info!(aps_class = ?cleaned, "切换 APS 类别");
        self.selection.aps_class = cleaned;
        self.orchestrator.reset();

        if let Err(e) = self.load_product_data().await {
            warn!(error = %e, "产品数据加载失败");
        }
        Ok(Some(self.orchestrator.input_changed()))
    }

    /// 切换年份; 旧年份的结果随之丢弃
    pub fn select_year(&mut self, year: i32) -> Option<DebounceToken> {
        if self.selection.year == Some(year) {
            return None;
        }
        info!(year, "切换年份");
        self.selection.year = Some(year);
        self.orchestrator.reset();
        Some(self.orchestrator.input_changed())
    }

    /// 加载当前产品(+类别)的数据并选中最近年份; 失败时数据复位
    pub async fn load_product_data(&mut self) -> SessionResult<()> {
        let product = self
            .selection
            .product
            .clone()
            .ok_or(SessionError::NoProductSelected)?;
        let aps_class = clean_aps_class(self.selection.aps_class.as_deref());
        self.load_error = None;

        match self.service.get_product_data(&product, aps_class.as_deref()).await {
            Ok(data) => {
                self.selection.year = data.default_year();
                info!(
                    product = %product,
                    aps_class = ?aps_class,
                    years = data.available_years.len(),
                    selected_year = ?self.selection.year,
                    "产品数据已加载"
                );
                self.loaded = Some(LoadedData {
                    product,
                    aps_class,
                    data,
                });
                Ok(())
            }
            Err(e) => {
                self.loaded = None;
                self.selection.year = None;
                self.load_error = Some(e.user_message());
                Err(e.into())
            }
        }
    }

    // ==========================================
    // 锁定事件与情景参数
    // ==========================================

    /// 分派锁定事件动作
    ///
    /// # 返回
    /// - Ok(None): 状态无变化
    pub fn dispatch_locked(&mut self, action: LockedEventAction) -> SessionResult<Option<DebounceToken>> {
        let changed = self.locked.dispatch(action)?;
        Ok(changed.then(|| self.orchestrator.input_changed()))
    }

    /// 由类别的待定设置锁定事件, 成功后复位该类别的待定设置
    pub fn lock_pending(&mut self, category: EventCategory) -> SessionResult<DebounceToken> {
        let event = LockedEvent::from_pending(category, self.params.params().pending(category))
            .ok_or(SessionError::NoMonthSelected(category))?;
        info!(category = %category, month = %event.month, multiplier = event.multiplier, "锁定事件");
        self.locked.lock(category, event)?;
        self.params.update(ParameterPatch::ResetEvent(category));
        Ok(self.orchestrator.input_changed())
    }

    pub fn update_params(&mut self, patch: ParameterPatch) -> DebounceToken {
        self.params.update(patch);
        self.orchestrator.input_changed()
    }

    pub fn reset_params(&mut self) -> DebounceToken {
        self.params.reset();
        self.orchestrator.input_changed()
    }

    // ==========================================
    // 编排驱动
    // ==========================================

    /// 防抖计时到期
    pub fn on_timer_fired(&mut self, token: DebounceToken) -> TimerOutcome {
        let key = self.selection.key();
        let locked = self.locked.snapshot();
        let params = self.params.snapshot();
        let data = match (&self.loaded, &key) {
            (Some(loaded), Some(key)) if loaded.matches(key) => Some(&loaded.data),
            _ => None,
        };
        let inputs = SimulationInputs {
            selection: key.as_ref(),
            data,
            locked_events: &locked,
            locked_revision: self.locked.revision(),
            params: &params,
        };
        self.orchestrator.timer_fired(token, inputs)
    }

    /// 模拟响应到达
    pub fn on_simulation_response(
        &mut self,
        seq: u64,
        response: Result<SimulationResult, ApiError>,
    ) -> ResponseOutcome {
        let outcome = self.orchestrator.response_received(seq, response.map_err(Into::into));
        if outcome == ResponseOutcome::Accepted {
            self.warnings.reset_dismissal();
        }
        outcome
    }

    /// 当前输入是否与最后一次发出的请求不同
    pub fn needs_update(&self) -> bool {
        let key = self.selection.key();
        let locked = self.locked.snapshot();
        let params = self.params.snapshot();
        self.orchestrator.needs_update(&SimulationInputs {
            selection: key.as_ref(),
            data: self.product_data(),
            locked_events: &locked,
            locked_revision: self.locked.revision(),
            params: &params,
        })
    }

    // ==========================================
    // 派生数据
    // ==========================================

    pub fn summary(&self) -> Option<SummaryStats> {
        let result = self.display_result()?;
        let baseline = self.current_baseline()?;
        Some(summarize(&result.simulated, baseline))
    }

    /// 固定纵轴区间; 数据未就绪时返回默认区间且不缓存
    pub fn fixed_domain(&mut self) -> FixedDomain {
        let Some(key) = self.selection.key() else {
            return FixedDomain::DEFAULT;
        };
        let data = match &self.loaded {
            Some(loaded) if loaded.matches(&key) => &loaded.data,
            _ => return FixedDomain::DEFAULT,
        };
        let year = key.year;
        self.domains.get_or_compute(&key, || {
            compute_domain(
                values_of(data.baseline_for(year)),
                values_of(data.delivered_for(year)),
                values_of(data.actuals_for(year)),
            )
        })
    }

    pub fn domain_computations(&self) -> u64 {
        self.domains.computations()
    }

    pub fn warnings_visible(&self) -> bool {
        self.warnings.is_visible(self.display_result())
    }

    pub fn dismiss_warnings(&mut self) {
        self.warnings.dismiss();
    }

    pub fn set_warnings_enabled(&mut self, enabled: bool) {
        self.warnings.set_enabled(enabled);
    }

    // ==========================================
    // 导出
    // ==========================================

    fn export_context(&self) -> SessionResult<(SelectionKey, &SimulationResult, MonthlySeries)> {
        let key = self.selection.key().ok_or(SessionError::NoProductSelected)?;
        let result = self.display_result().ok_or(SessionError::NothingToExport)?;
        let baseline = self.current_baseline().cloned().unwrap_or_default();
        Ok((key, result, baseline))
    }

    pub fn export_rows(&self) -> SessionResult<Vec<ExportRow>> {
        let (key, result, baseline) = self.export_context()?;
        let ctx = ExportContext {
            product: &key.product,
            aps_class: key.aps_class.as_deref(),
            year: key.year,
            ms_mode: self.params.params().ms_mode,
        };
        Ok(to_export_rows(&ctx, result, &baseline))
    }

    /// 本地生成 CSV
    pub fn export_csv(&self) -> SessionResult<ExportFile> {
        let rows = self.export_rows()?;
        let (key, _, _) = self.export_context()?;
        Ok(ExportFile {
            filename: export_filename(&key.product, key.aps_class.as_deref(), key.year),
            content: to_csv(&rows)?,
        })
    }

    /// 服务端生成 CSV
    pub async fn export_via_service(&self) -> SessionResult<ExportResponse> {
        let request = {
            let (key, result, baseline) = self.export_context()?;
            let ctx = ExportContext {
                product: &key.product,
                aps_class: key.aps_class.as_deref(),
                year: key.year,
                ms_mode: self.params.params().ms_mode,
            };
            ExportRequest::new(&ctx, result, &baseline)
        };
        Ok(self.service.export(&request).await?)
    }

    pub fn view(&mut self) -> SessionView {
        SessionView {
            selection: self.selection.clone(),
            simulation: self.orchestrator.view(),
            locked_events: self.locked.snapshot(),
            params: self.params.snapshot(),
            summary: self.summary(),
            fixed_domain: self.fixed_domain(),
            warnings_visible: self.warnings_visible(),
            needs_update: self.needs_update(),
            load_error: self.load_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::simulation::ExceededMonth;

    #[test]
    fn test_warning_banner_visibility() {
        let mut banner = WarningBanner::new();
        let quiet = SimulationResult::default();
        let loud = SimulationResult {
            exceeded_months: vec![ExceededMonth {
                month: Month::Jun,
                simulated: Some(1265.0),
                baseline: Some(1000.0),
                threshold: Some(1100.0),
                reason: None,
            }],
            ..SimulationResult::default()
        };

        assert!(!banner.is_visible(None));
        assert!(!banner.is_visible(Some(&quiet)));
        assert!(banner.is_visible(Some(&loud)));

        banner.dismiss();
        assert!(!banner.is_visible(Some(&loud)));
        banner.reset_dismissal();
        assert!(banner.is_visible(Some(&loud)));

        banner.set_enabled(false);
        assert!(!banner.is_visible(Some(&loud)));
    }
}
