// ==========================================
// 预测情景模拟 - 情景参数仓
// ==========================================
// 职责: 持有尚未锁定的情景配置, 每次修改产生新的不可变快照
// 红线: 只做类型层面的合并, 不做范围钳制
// ==========================================

use crate::domain::scenario::{
    EventSettingsPatch, MarketShareParams, PendingEventSettings, ScenarioParameters, ToggleKey,
};
use crate::domain::types::{EventCategory, MarketShareMode};
use std::sync::Arc;
use tracing::debug;

// ==========================================
// ScenarioSnapshot - 带版本号的不可变快照
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioSnapshot {
    pub version: u64,
    pub params: Arc<ScenarioParameters>,
}

// ==========================================
// ParameterPatch - 按分区的局部更新
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterPatch {
    /// 切换市场份额模式（参数保留）
    MarketShareMode(MarketShareMode),
    /// 合并市场份额参数
    MarketShare(MarketShareParams),
    /// 合并某类别的待定设置
    Event(EventCategory, EventSettingsPatch),
    /// 复位某类别的待定设置
    ResetEvent(EventCategory),
    Toggle(ToggleKey, bool),
    Damping(f64),
}

impl ParameterPatch {
    pub fn section(&self) -> &'static str {
        match self {
            ParameterPatch::MarketShareMode(_) | ParameterPatch::MarketShare(_) => "market_share",
            ParameterPatch::Event(..) | ParameterPatch::ResetEvent(_) => "event_settings",
            ParameterPatch::Toggle(..) => "toggle_settings",
            ParameterPatch::Damping(_) => "damp_k",
        }
    }
}

// ==========================================
// ScenarioParameterStore
// ==========================================
#[derive(Debug, Clone)]
pub struct ScenarioParameterStore {
    current: ScenarioSnapshot,
}

impl ScenarioParameterStore {
    pub fn new() -> Self {
        Self {
            current: ScenarioSnapshot {
                version: 0,
                params: Arc::new(ScenarioParameters::default()),
            },
        }
    }

    pub fn snapshot(&self) -> ScenarioSnapshot {
        self.current.clone()
    }

    pub fn params(&self) -> &ScenarioParameters {
        &self.current.params
    }

    pub fn version(&self) -> u64 {
        self.current.version
    }

    /// 合并局部更新, 返回新快照
    pub fn update(&mut self, patch: ParameterPatch) -> ScenarioSnapshot {
        let section = patch.section();
        let mut next = (*self.current.params).clone();

        match patch {
            ParameterPatch::MarketShareMode(mode) => next.ms_mode = mode,
            ParameterPatch::MarketShare(params) => next.ms_params.merge(params),
            ParameterPatch::Event(category, settings) => settings.apply(next.pending_mut(category)),
            ParameterPatch::ResetEvent(category) => {
                *next.pending_mut(category) = PendingEventSettings::default_for(category);
            }
            ParameterPatch::Toggle(key, value) => next.toggle_settings.set(key, value),
            ParameterPatch::Damping(k) => next.damp_k = k,
        }

        self.replace(next, section)
    }

    /// 恢复默认参数
    pub fn reset(&mut self) -> ScenarioSnapshot {
        self.replace(ScenarioParameters::default(), "all")
    }

    fn replace(&mut self, next: ScenarioParameters, section: &str) -> ScenarioSnapshot {
        self.current = ScenarioSnapshot {
            version: self.current.version + 1,
            params: Arc::new(next),
        };
        debug!(section, version = self.current.version, "情景参数已更新");
        self.snapshot()
    }
}

impl Default for ScenarioParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Month;

    #[test]
    fn test_update_produces_new_snapshot() {
        let mut store = ScenarioParameterStore::new();
        let before = store.snapshot();

        let after = store.update(ParameterPatch::MarketShare(MarketShareParams::relative(10.0)));

        assert_eq!(before.params.ms_params.delta, Some(0.0));
        assert_eq!(after.params.ms_params.delta, Some(10.0));
        assert_eq!(after.version, before.version + 1);
        assert!(!Arc::ptr_eq(&before.params, &after.params));
    }

    #[test]
    fn test_event_patch_touches_one_category() {
        let mut store = ScenarioParameterStore::new();
        store.update(ParameterPatch::Event(
            EventCategory::Custom,
            EventSettingsPatch::month(Month::Oct).with_weight(1.4),
        ));

        let params = store.params();
        assert_eq!(params.custom_settings.month, Some(Month::Oct));
        assert_eq!(params.custom_settings.weight, Some(1.4));
        assert_eq!(params.promo_settings, PendingEventSettings::promotion_default());
    }

    #[test]
    fn test_no_range_clamping() {
        let mut store = ScenarioParameterStore::new();
        store.update(ParameterPatch::Event(
            EventCategory::Shortage,
            EventSettingsPatch::default().with_pct(-250.0),
        ));
        store.update(ParameterPatch::Damping(7.5));
        assert_eq!(store.params().shortage_settings.pct, -250.0);
        assert_eq!(store.params().damp_k, 7.5);
    }

    #[test]
    fn test_mode_switch_keeps_params_and_reset_restores_defaults() {
        let mut store = ScenarioParameterStore::new();
        store.update(ParameterPatch::MarketShare(MarketShareParams::relative(4.0)));
        store.update(ParameterPatch::MarketShareMode(MarketShareMode::Macro));
        store.update(ParameterPatch::Toggle(ToggleKey::Trend, true));
        assert_eq!(store.params().ms_mode, MarketShareMode::Macro);
        assert_eq!(store.params().ms_params.delta, Some(4.0));

        let snapshot = store.reset();
        assert_eq!(*snapshot.params, ScenarioParameters::default());
        assert_eq!(snapshot.version, 4);
    }
}
