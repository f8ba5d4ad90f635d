// ==========================================
// 预测情景模拟 - 领域模型层
// ==========================================
// 职责: 定义领域实体、值对象、封闭枚举
// 红线: 不含 I/O, 不含编排逻辑
// ==========================================

pub mod event;
pub mod scenario;
pub mod selection;
pub mod series;
pub mod simulation;
pub mod types;

// 重导出核心类型
pub use event::{LockedEvent, LockedEventSet};
pub use scenario::{
    EventSettingsPatch, MarketShareParams, PendingEventSettings, ScenarioParameters,
    ToggleKey, ToggleSettings,
};
pub use selection::{clean_aps_class, Selection, SelectionKey, PRODUCT_TOTAL_LABEL};
pub use series::{
    numeric, MonthlySeries, ProductCatalog, ProductData, WeightColumn, Weights, YearlySeries,
};
pub use simulation::{AppliedFactor, ExceededMonth, SimulationRequest, SimulationResult};
pub use types::{CompetitivePattern, EventCategory, MarketShareMode, Month};
