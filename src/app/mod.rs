// ==========================================
// 预测情景模拟 - 应用层
// ==========================================
// 职责: 会话对象与驱动它的事件循环
// ==========================================

pub mod runtime;
pub mod session;

// 重导出
pub use runtime::{CommandReply, SessionCommand, SessionHandle, SessionRuntime};
pub use session::{
    ExportFile, ScenarioSession, SessionError, SessionResult, SessionView, WarningBanner,
};
