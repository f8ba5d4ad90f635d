// ==========================================
// 预测情景模拟 - 情景参数
// ==========================================
// 职责: 尚未锁定的情景配置（市场份额、各类别待定设置、全局开关、阻尼系数）
// 说明: 字段名与外部服务请求体一致, 以 flatten 方式拼入 SimulationRequest
// 红线: 不做范围校验, 取值范围由外部服务裁定
// ==========================================

use crate::domain::types::{CompetitivePattern, EventCategory, MarketShareMode, Month};
use serde::{Deserialize, Serialize};

// ==========================================
// 市场份额参数
// ==========================================
// 不同模式使用不同字段, 未使用的字段保持 None 且不下发
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketShareParams {
    // relative
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,

    // historical
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_strength: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_seasonality: Option<bool>,

    // competitive
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<CompetitivePattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<Month>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_month: Option<Month>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_month: Option<Month>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cumulative_impact: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_duration: Option<u32>,

    // macro
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_growth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub our_capacity: Option<f64>,
}

impl MarketShareParams {
    /// 相对变化参数
    pub fn relative(delta: f64) -> Self {
        Self {
            delta: Some(delta),
            ..Self::default()
        }
    }

    /// 字段级合并: patch 中 Some 的字段覆盖当前值
    pub fn merge(&mut self, patch: MarketShareParams) {
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $( if patch.$field.is_some() { self.$field = patch.$field; } )*
            };
        }
        take!(
            delta,
            trend_strength,
            apply_seasonality,
            pattern,
            month,
            impact,
            duration,
            start_month,
            end_month,
            cumulative_impact,
            loss_duration,
            initial_loss,
            recovery_duration,
            market_growth,
            our_capacity,
        );
    }
}

// ==========================================
// 各类别待定事件设置
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingEventSettings {
    /// 未选择时下发 null
    #[serde(default)]
    pub month: Option<Month>,
    #[serde(default)]
    pub pct: f64,
    /// 仅自定义事件
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// 仅促销
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spill_enabled: Option<bool>,
    /// 仅促销
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spill_pct: Option<f64>,
}

impl PendingEventSettings {
    pub fn promotion_default() -> Self {
        Self {
            month: None,
            pct: 0.0,
            weight: None,
            spill_enabled: Some(true),
            spill_pct: Some(10.0),
        }
    }

    pub fn custom_default() -> Self {
        Self {
            month: None,
            pct: 0.0,
            weight: Some(1.0),
            spill_enabled: None,
            spill_pct: None,
        }
    }

    /// 类别的初始设置
    pub fn default_for(category: EventCategory) -> Self {
        match category {
            EventCategory::Promotion => Self::promotion_default(),
            EventCategory::Custom => Self::custom_default(),
            EventCategory::Shortage | EventCategory::Regulation => Self::default(),
        }
    }
}

/// 待定设置的局部更新
///
/// `month: Some(None)` 表示清除已选月份
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSettingsPatch {
    pub month: Option<Option<Month>>,
    pub pct: Option<f64>,
    pub weight: Option<f64>,
    pub spill_enabled: Option<bool>,
    pub spill_pct: Option<f64>,
}

impl EventSettingsPatch {
    pub fn month(month: Month) -> Self {
        Self {
            month: Some(Some(month)),
            ..Self::default()
        }
    }

    pub fn with_pct(mut self, pct: f64) -> Self {
        self.pct = Some(pct);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub(crate) fn apply(self, settings: &mut PendingEventSettings) {
        if let Some(month) = self.month {
            settings.month = month;
        }
        if let Some(pct) = self.pct {
            settings.pct = pct;
        }
        if self.weight.is_some() {
            settings.weight = self.weight;
        }
        if self.spill_enabled.is_some() {
            settings.spill_enabled = self.spill_enabled;
        }
        if self.spill_pct.is_some() {
            settings.spill_pct = self.spill_pct;
        }
    }
}

// ==========================================
// 全局效果开关
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleSettings {
    /// 剔除历史三月疯狂效应
    #[serde(default)]
    pub march_madness: bool,
    /// 锁定三月（促销不回扣三月）
    #[serde(default)]
    pub lock_march: bool,
    #[serde(default)]
    pub trend: bool,
    /// Sep-Dec 过渡
    #[serde(default)]
    pub trans: bool,
    #[serde(default)]
    pub pf_pos: bool,
    #[serde(default)]
    pub pf_neg: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToggleKey {
    MarchMadness,
    LockMarch,
    Trend,
    Trans,
    PfPos,
    PfNeg,
}

impl ToggleSettings {
    pub fn set(&mut self, key: ToggleKey, value: bool) {
        match key {
            ToggleKey::MarchMadness => self.march_madness = value,
            ToggleKey::LockMarch => self.lock_march = value,
            ToggleKey::Trend => self.trend = value,
            ToggleKey::Trans => self.trans = value,
            ToggleKey::PfPos => self.pf_pos = value,
            ToggleKey::PfNeg => self.pf_neg = value,
        }
    }

    pub fn get(&self, key: ToggleKey) -> bool {
        match key {
            ToggleKey::MarchMadness => self.march_madness,
            ToggleKey::LockMarch => self.lock_march,
            ToggleKey::Trend => self.trend,
            ToggleKey::Trans => self.trans,
            ToggleKey::PfPos => self.pf_pos,
            ToggleKey::PfNeg => self.pf_neg,
        }
    }

    /// 三月相关开关是否生效（影响促销可选月份）
    pub fn march_effects_active(&self) -> bool {
        self.march_madness || self.lock_march
    }
}

// ==========================================
// ScenarioParameters - 情景参数全集
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParameters {
    pub ms_mode: MarketShareMode,
    pub ms_params: MarketShareParams,
    pub promo_settings: PendingEventSettings,
    pub shortage_settings: PendingEventSettings,
    pub regulation_settings: PendingEventSettings,
    pub custom_settings: PendingEventSettings,
    pub toggle_settings: ToggleSettings,
    pub damp_k: f64,
}

impl ScenarioParameters {
    /// 默认阻尼系数
    pub const DEFAULT_DAMP_K: f64 = 0.5;

    pub fn pending(&self, category: EventCategory) -> &PendingEventSettings {
        match category {
            EventCategory::Promotion => &self.promo_settings,
            EventCategory::Shortage => &self.shortage_settings,
            EventCategory::Regulation => &self.regulation_settings,
            EventCategory::Custom => &self.custom_settings,
        }
    }

    pub fn pending_mut(&mut self, category: EventCategory) -> &mut PendingEventSettings {
        match category {
            EventCategory::Promotion => &mut self.promo_settings,
            EventCategory::Shortage => &mut self.shortage_settings,
            EventCategory::Regulation => &mut self.regulation_settings,
            EventCategory::Custom => &mut self.custom_settings,
        }
    }
}

impl Default for ScenarioParameters {
    fn default() -> Self {
        Self {
            ms_mode: MarketShareMode::Relative,
            ms_params: MarketShareParams::relative(0.0),
            promo_settings: PendingEventSettings::promotion_default(),
            shortage_settings: PendingEventSettings::default(),
            regulation_settings: PendingEventSettings::default(),
            custom_settings: PendingEventSettings::custom_default(),
            toggle_settings: ToggleSettings::default(),
            damp_k: Self::DEFAULT_DAMP_K,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_wire_shape() {
        let json = serde_json::to_value(ScenarioParameters::default()).unwrap();
        assert_eq!(json["ms_mode"], "relative");
        assert_eq!(json["ms_params"]["delta"], 0.0);
        assert!(json["promo_settings"]["month"].is_null());
        assert_eq!(json["promo_settings"]["spill_pct"], 10.0);
        assert_eq!(json["custom_settings"]["weight"], 1.0);
        assert!(json["shortage_settings"].get("spill_pct").is_none());
        assert_eq!(json["toggle_settings"]["lock_march"], false);
        assert_eq!(json["damp_k"], 0.5);
    }

    #[test]
    fn test_market_share_merge_keeps_untouched_fields() {
        let mut params = MarketShareParams::relative(5.0);
        params.merge(MarketShareParams {
            market_growth: Some(3.0),
            ..MarketShareParams::default()
        });
        assert_eq!(params.delta, Some(5.0));
        assert_eq!(params.market_growth, Some(3.0));
    }

    #[test]
    fn test_settings_patch_clears_month() {
        let mut settings = PendingEventSettings::default();
        EventSettingsPatch::month(Month::May).with_pct(12.0).apply(&mut settings);
        assert_eq!(settings.month, Some(Month::May));
        assert_eq!(settings.pct, 12.0);

        EventSettingsPatch {
            month: Some(None),
            ..EventSettingsPatch::default()
        }
        .apply(&mut settings);
        assert_eq!(settings.month, None);
        assert_eq!(settings.pct, 12.0);
    }
}
