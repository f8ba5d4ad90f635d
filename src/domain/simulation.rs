// ==========================================
// 预测情景模拟 - 模拟请求与结果
// ==========================================
// 职责: 与外部模拟服务交换的值对象
// 红线: SimulationRequest 每次新建, 发送后不再修改
// 红线: SimulationResult 整体替换, 不做增量修补
// ==========================================

use crate::domain::event::LockedEventSet;
use crate::domain::scenario::ScenarioParameters;
use crate::domain::series::{null_as_default, MonthlySeries, Weights, YearlySeries};
use crate::domain::types::Month;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// SimulationRequest
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub baseline_vals: MonthlySeries,
    pub weights: Weights,
    pub market_share_data: YearlySeries,
    pub selected_year: i32,
    pub locked_events: LockedEventSet,
    #[serde(flatten)]
    pub params: ScenarioParameters,
}

// ==========================================
// SimulationResult
// ==========================================

/// 某月生效的单个因子 (名称, 乘数)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedFactor(pub String, pub f64);

impl AppliedFactor {
    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn multiplier(&self) -> f64 {
        self.1
    }
}

/// 超出波动阈值、建议复核的月份
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceededMonth {
    pub month: Month,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulated: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ExceededMonth {
    /// 展示原因; 服务端未给出时由阈值推导
    pub fn reason_text(&self) -> String {
        if let Some(reason) = &self.reason {
            return reason.clone();
        }
        match (self.simulated, self.threshold) {
            (Some(sim), Some(threshold)) => format!(
                "{}: Review Recommended (simulated {:.2} > threshold {:.2})",
                self.month, sim, threshold
            ),
            _ => format!("{}: Review Recommended", self.month),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub simulated: MonthlySeries,
    #[serde(default, deserialize_with = "null_as_default")]
    pub final_multipliers: BTreeMap<Month, f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub applied_details: BTreeMap<Month, Vec<AppliedFactor>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ms_adjustments: BTreeMap<Month, f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exceeded_months: Vec<ExceededMonth>,
}

impl SimulationResult {
    pub fn simulated_for(&self, month: Month) -> Option<f64> {
        self.simulated.get(month)
    }

    /// 事件乘数, 缺失为 1.0
    pub fn event_multiplier(&self, month: Month) -> f64 {
        self.final_multipliers.get(&month).copied().unwrap_or(1.0)
    }

    /// 市场份额乘数, 缺失为 1.0
    pub fn ms_adjustment(&self, month: Month) -> f64 {
        self.ms_adjustments.get(&month).copied().unwrap_or(1.0)
    }

    pub fn applied_for(&self, month: Month) -> &[AppliedFactor] {
        self.applied_details
            .get(&month)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}
