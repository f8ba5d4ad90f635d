// ==========================================
// 预测情景模拟 - 核心库
// ==========================================
// 职责: 锁定事件/情景参数状态机、模拟请求编排、固定纵轴区间与导出
// 系统定位: 决策支持（数值模拟由外部预测服务完成）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 状态机与编排
pub mod engine;

// 配置层 - 服务配置
pub mod config;

// 日志系统
pub mod logging;

// API 层 - 外部预测服务
pub mod api;

// 应用层 - 会话与事件循环
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CompetitivePattern, EventCategory, MarketShareMode, Month};

// 领域实体
pub use domain::{
    LockedEvent, LockedEventSet, MonthlySeries, ProductCatalog, ProductData, ScenarioParameters,
    Selection, SelectionKey, SimulationRequest, SimulationResult,
};

// 引擎
pub use engine::{
    compute_domain, summarize, FixedDomain, LockedEventStore, ScenarioParameterStore,
    SimulationOrchestrator,
};

// API
pub use api::{ApiError, ForecastService, HttpForecastService};

// 应用
pub use app::{ScenarioSession, SessionHandle, SessionRuntime};

// 配置
pub use config::ServiceConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "预测情景模拟";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
