// ==========================================
// 预测情景模拟 - 引擎层事件发布
// ==========================================
// 职责: 定义编排器通知 trait, 观察方实现
// 说明: 引擎只依赖 trait, 不依赖具体的展示层
// ==========================================

use crate::domain::selection::SelectionKey;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 模拟事件类型
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEventType {
    /// 已发出请求
    RequestIssued,
    /// 结果被接受
    ResultAccepted,
    /// 最新请求失败
    RequestFailed,
    /// 过期响应被丢弃
    StaleDropped,
    /// 前置条件不满足, 未发请求
    RequestSkipped,
}

impl SimulationEventType {
    pub fn as_str(&self) -> &str {
        match self {
            SimulationEventType::RequestIssued => "RequestIssued",
            SimulationEventType::ResultAccepted => "ResultAccepted",
            SimulationEventType::RequestFailed => "RequestFailed",
            SimulationEventType::StaleDropped => "StaleDropped",
            SimulationEventType::RequestSkipped => "RequestSkipped",
        }
    }
}

/// 模拟事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// 请求序号（跳过时为 None）
    pub seq: Option<u64>,
    pub event_type: SimulationEventType,
    /// 事件发生时的选择
    pub selection: Option<SelectionKey>,
}

impl SimulationEvent {
    pub fn new(event_type: SimulationEventType, seq: Option<u64>, selection: Option<SelectionKey>) -> Self {
        Self {
            seq,
            event_type,
            selection,
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 模拟事件发布者
///
/// 过期响应丢弃时也会发布 StaleDropped, 但编排器状态与展示结果均不变
pub trait SimulationEventPublisher: Send + Sync {
    /// 发布模拟事件
    ///
    /// # 参数
    /// - `event`: 模拟事件
    ///
    /// # 返回
    /// - `Err`: 发布失败（编排器只记录日志, 不回滚状态）
    fn publish(&self, event: SimulationEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl SimulationEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: SimulationEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::trace!(
            event_type = event.event_type.as_str(),
            seq = ?event.seq,
            "NoOpEventPublisher: 跳过事件发布"
        );
        Ok(())
    }
}

/// 可选的事件发布者包装
#[derive(Clone)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn SimulationEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn with_publisher(publisher: Arc<dyn SimulationEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件; 失败只记日志
    pub fn publish(&self, event: SimulationEvent) {
        if let Some(publisher) = &self.inner {
            let event_type = event.event_type.as_str().to_string();
            if let Err(e) = publisher.publish(event) {
                tracing::warn!(event_type = %event_type, error = %e, "模拟事件发布失败");
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for OptionalEventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionalEventPublisher")
            .field("configured", &self.is_configured())
            .finish()
    }
}
