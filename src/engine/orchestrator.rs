// ==========================================
// 预测情景模拟 - 模拟编排器
// ==========================================
// 状态: Idle / PendingDebounce / InFlight / Settled / Failed
// 职责: 防抖后发出唯一的在途请求, 按序号丢弃过期响应
// 红线: 只接受最近一次发出的请求的响应（后发先至也以序号为准）
// 红线: 失败不清空上一次成功结果, 展示层继续显示旧曲线
// 说明: 编排器不持有 I/O, 计时与网络调用由运行时驱动
// ==========================================

use crate::domain::event::LockedEventSet;
use crate::domain::selection::SelectionKey;
use crate::domain::series::ProductData;
use crate::domain::simulation::{SimulationRequest, SimulationResult};
use crate::engine::debounce::{DebounceToken, Debouncer};
use crate::engine::events::{OptionalEventPublisher, SimulationEvent, SimulationEventType};
use crate::engine::scenario_params::ScenarioSnapshot;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

// ==========================================
// 失败与跳过
// ==========================================

/// 最新请求的失败（网络或服务端校验）
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message} ({code})")]
pub struct SimulationFailure {
    pub message: String,
    pub code: String,
}

impl SimulationFailure {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
        }
    }
}

/// 前置条件不满足的原因（不是错误）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// 产品或年份未选择
    MissingSelection,
    /// 该选择下没有基线数据
    NoBaselineData,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingSelection => "MissingSelection",
            SkipReason::NoBaselineData => "NoBaselineData",
        }
    }
}

// ==========================================
// 状态
// ==========================================

#[derive(Debug, Clone, PartialEq)]
pub enum OrchestratorState {
    Idle,
    PendingDebounce,
    InFlight { seq: u64 },
    Settled(Arc<SimulationResult>),
    Failed(SimulationFailure),
}

impl OrchestratorState {
    pub fn status(&self) -> OrchestratorStatus {
        match self {
            OrchestratorState::Idle => OrchestratorStatus::Idle,
            OrchestratorState::PendingDebounce => OrchestratorStatus::PendingDebounce,
            OrchestratorState::InFlight { .. } => OrchestratorStatus::InFlight,
            OrchestratorState::Settled(_) => OrchestratorStatus::Settled,
            OrchestratorState::Failed(_) => OrchestratorStatus::Failed,
        }
    }
}

/// 状态标签（不带负载）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrchestratorStatus {
    Idle,
    PendingDebounce,
    InFlight,
    Settled,
    Failed,
}

impl OrchestratorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestratorStatus::Idle => "Idle",
            OrchestratorStatus::PendingDebounce => "PendingDebounce",
            OrchestratorStatus::InFlight => "InFlight",
            OrchestratorStatus::Settled => "Settled",
            OrchestratorStatus::Failed => "Failed",
        }
    }

    /// 是否有计时或请求尚未结束
    pub fn is_busy(&self) -> bool {
        matches!(self, OrchestratorStatus::PendingDebounce | OrchestratorStatus::InFlight)
    }
}

// ==========================================
// 输入与输出
// ==========================================

/// 计时到期时编排器读取的组合快照
#[derive(Debug, Clone, Copy)]
pub struct SimulationInputs<'a> {
    pub selection: Option<&'a SelectionKey>,
    /// 已为该选择加载的数据
    pub data: Option<&'a ProductData>,
    pub locked_events: &'a LockedEventSet,
    pub locked_revision: u64,
    pub params: &'a ScenarioSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InputFingerprint {
    selection: SelectionKey,
    params_version: u64,
    locked_revision: u64,
}

/// 已发出的请求
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedRequest {
    pub seq: u64,
    pub selection: SelectionKey,
    pub request: SimulationRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimerOutcome {
    /// token 已被替换或取消
    Ignored,
    Skipped(SkipReason),
    Issued(IssuedRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    Accepted,
    Failed,
    /// 过期响应, 静默丢弃
    Stale,
}

/// 供观察方渲染的只读视图
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorView {
    pub status: OrchestratorStatus,
    /// 最后一次成功结果（失败时仍保留）
    pub display_result: Option<Arc<SimulationResult>>,
    pub error: Option<SimulationFailure>,
    pub latest_seq: u64,
    pub accepted_seq: Option<u64>,
    pub last_skip: Option<SkipReason>,
}

// ==========================================
// SimulationOrchestrator
// ==========================================

#[derive(Debug)]
pub struct SimulationOrchestrator {
    state: OrchestratorState,
    debouncer: Debouncer,
    /// 最近一次发出的序号（单调递增, 从 1 开始）
    latest_seq: u64,
    /// 仍在等待的最新请求
    awaiting: Option<(u64, SelectionKey)>,
    accepted_seq: Option<u64>,
    last_good: Option<Arc<SimulationResult>>,
    last_issued: Option<InputFingerprint>,
    last_skip: Option<SkipReason>,
    publisher: OptionalEventPublisher,
}

impl SimulationOrchestrator {
    /// 创建编排器
    ///
    /// # 参数
    /// - debounce_delay: 尾随防抖延时
    /// - publisher: 状态变化通知
    pub fn new(debounce_delay: Duration, publisher: OptionalEventPublisher) -> Self {
        Self {
            state: OrchestratorState::Idle,
            debouncer: Debouncer::new(debounce_delay),
            latest_seq: 0,
            awaiting: None,
            accepted_seq: None,
            last_good: None,
            last_issued: None,
            last_skip: None,
            publisher,
        }
    }

    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    pub fn debounce_delay(&self) -> Duration {
        self.debouncer.delay()
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    pub fn display_result(&self) -> Option<&Arc<SimulationResult>> {
        self.last_good.as_ref()
    }

    pub fn view(&self) -> OrchestratorView {
        OrchestratorView {
            status: self.state.status(),
            display_result: self.last_good.clone(),
            error: match &self.state {
                OrchestratorState::Failed(failure) => Some(failure.clone()),
                _ => None,
            },
            latest_seq: self.latest_seq,
            accepted_seq: self.accepted_seq,
            last_skip: self.last_skip,
        }
    }

    // ==========================================
    // 状态转换
    // ==========================================

    /// 相关输入发生变化: (重新)开始防抖
    pub fn input_changed(&mut self) -> DebounceToken {
        let restarted = self.debouncer.is_scheduled();
        let token = self.debouncer.schedule();
        self.state = OrchestratorState::PendingDebounce;
        debug!(token = token.value(), restarted, "防抖计时开始");
        token
    }

    /// 防抖计时到期
    ///
    /// # 返回
    /// - Ignored: 过期 token
    /// - Skipped: 前置条件不满足, 转入 Idle
    /// - Issued: 已构造请求并转入 InFlight
    pub fn timer_fired(&mut self, token: DebounceToken, inputs: SimulationInputs<'_>) -> TimerOutcome {
        if !self.debouncer.fire(token) {
            debug!(token = token.value(), "过期的防抖 token, 忽略");
            return TimerOutcome::Ignored;
        }

        let (key, data) = match Self::check_preconditions(&inputs) {
            Ok(pair) => pair,
            Err(reason) => {
                debug!(reason = reason.as_str(), "前置条件不满足, 不发请求");
                // 在途请求对应的输入已被取代
                self.awaiting = None;
                self.state = OrchestratorState::Idle;
                self.last_skip = Some(reason);
                self.publisher.publish(SimulationEvent::new(
                    SimulationEventType::RequestSkipped,
                    None,
                    inputs.selection.cloned(),
                ));
                return TimerOutcome::Skipped(reason);
            }
        };

        let request = Self::build_request(key, data, &inputs);
        self.latest_seq += 1;
        let seq = self.latest_seq;
        self.awaiting = Some((seq, key.clone()));
        self.state = OrchestratorState::InFlight { seq };
        self.last_skip = None;
        self.last_issued = Some(InputFingerprint {
            selection: key.clone(),
            params_version: inputs.params.version,
            locked_revision: inputs.locked_revision,
        });

        info!(
            seq,
            selection = %key,
            locked_events = request.locked_events.total(),
            ms_mode = request.params.ms_mode.as_str(),
            "发出模拟请求"
        );
        self.publisher.publish(SimulationEvent::new(
            SimulationEventType::RequestIssued,
            Some(seq),
            Some(key.clone()),
        ));

        TimerOutcome::Issued(IssuedRequest {
            seq,
            selection: key.clone(),
            request,
        })
    }

    /// 响应到达
    ///
    /// # 参数
    /// - seq: 请求序号
    /// - response: 成功结果或失败
    pub fn response_received(
        &mut self,
        seq: u64,
        response: Result<SimulationResult, SimulationFailure>,
    ) -> ResponseOutcome {
        let selection = match &self.awaiting {
            Some((awaited, key)) if *awaited == seq => key.clone(),
            _ => {
                debug!(seq, latest_seq = self.latest_seq, "丢弃过期响应");
                self.publisher.publish(SimulationEvent::new(
                    SimulationEventType::StaleDropped,
                    Some(seq),
                    None,
                ));
                return ResponseOutcome::Stale;
            }
        };
        self.awaiting = None;
        let in_flight = matches!(self.state, OrchestratorState::InFlight { .. });

        match response {
            Ok(result) => {
                let result = Arc::new(result);
                self.last_good = Some(Arc::clone(&result));
                self.accepted_seq = Some(seq);
                if in_flight {
                    self.state = OrchestratorState::Settled(result);
                }
                info!(seq, selection = %selection, "模拟结果已接受");
                self.publisher.publish(SimulationEvent::new(
                    SimulationEventType::ResultAccepted,
                    Some(seq),
                    Some(selection),
                ));
                ResponseOutcome::Accepted
            }
            Err(failure) => {
                warn!(seq, selection = %selection, code = %failure.code, error = %failure.message, "模拟请求失败");
                if in_flight {
                    self.state = OrchestratorState::Failed(failure);
                }
                self.publisher.publish(SimulationEvent::new(
                    SimulationEventType::RequestFailed,
                    Some(seq),
                    Some(selection),
                ));
                ResponseOutcome::Failed
            }
        }
    }

    /// 选择整体切换（如切换产品）: 取消计时, 忘记在途请求与旧结果
    pub fn reset(&mut self) {
        self.debouncer.cancel();
        self.awaiting = None;
        self.last_good = None;
        self.last_issued = None;
        self.state = OrchestratorState::Idle;
        debug!(latest_seq = self.latest_seq, "编排器已复位");
    }

    /// 当前输入与最后一次发出的请求是否不同
    pub fn needs_update(&self, inputs: &SimulationInputs<'_>) -> bool {
        let Some(selection) = inputs.selection else {
            return false;
        };
        match &self.last_issued {
            None => true,
            Some(last) => {
                last.selection != *selection
                    || last.params_version != inputs.params.version
                    || last.locked_revision != inputs.locked_revision
            }
        }
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn check_preconditions<'a>(
        inputs: &SimulationInputs<'a>,
    ) -> Result<(&'a SelectionKey, &'a ProductData), SkipReason> {
        let key = inputs.selection.ok_or(SkipReason::MissingSelection)?;
        let data = inputs.data.ok_or(SkipReason::NoBaselineData)?;
        match data.baseline_for(key.year) {
            Some(series) if series.has_numeric() => Ok((key, data)),
            _ => Err(SkipReason::NoBaselineData),
        }
    }

    fn build_request(
        key: &SelectionKey,
        data: &ProductData,
        inputs: &SimulationInputs<'_>,
    ) -> SimulationRequest {
        SimulationRequest {
            baseline_vals: data.baseline_for(key.year).cloned().unwrap_or_default(),
            weights: data.weights.clone(),
            market_share_data: data.market_share.clone(),
            selected_year: key.year,
            locked_events: inputs.locked_events.clone(),
            params: (*inputs.params.params).clone(),
        }
    }
}
