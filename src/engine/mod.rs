// ==========================================
// 预测情景模拟 - 引擎层
// ==========================================
// 职责: 情景状态机与模拟编排, 纯逻辑
// 红线: 引擎不做 I/O, 计时与网络调用由 app 层驱动
// ==========================================

pub mod debounce;
pub mod events;
pub mod fixed_domain;
pub mod locked_events;
pub mod orchestrator;
pub mod scenario_params;
pub mod summary;

// 重导出核心引擎
pub use debounce::{DebounceToken, Debouncer, TimerState, DEFAULT_DEBOUNCE};
pub use events::{
    NoOpEventPublisher, OptionalEventPublisher, SimulationEvent, SimulationEventPublisher,
    SimulationEventType,
};
pub use fixed_domain::{compute_domain, FixedDomain, FixedDomainCache};
pub use locked_events::{reduce, ClearScope, LockError, LockedEventAction, LockedEventStore};
pub use orchestrator::{
    IssuedRequest, OrchestratorState, OrchestratorStatus, OrchestratorView, ResponseOutcome,
    SimulationFailure, SimulationInputs, SimulationOrchestrator, SkipReason, TimerOutcome,
};
pub use scenario_params::{ParameterPatch, ScenarioParameterStore, ScenarioSnapshot};
pub use summary::{
    export_filename, summarize, to_csv, to_export_rows, valid_month_range, write_csv_file,
    ExportContext, ExportError, ExportRow, SummaryStats, CSV_HEADER,
};
