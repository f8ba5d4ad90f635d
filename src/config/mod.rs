// ==========================================
// 预测情景模拟 - 配置层
// ==========================================
// 职责: 服务地址按构建环境选择, 超时/防抖/作用域可由环境变量覆写
// ==========================================

pub mod service_config;

// 重导出核心配置
pub use service_config::{
    config_keys, ensure_api_suffix, BuildEnvironment, ConfigError, LockedEventScope,
    ServiceConfig, DEV_BASE_URL,
};
