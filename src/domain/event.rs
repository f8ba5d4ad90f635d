// ==========================================
// 预测情景模拟 - 锁定事件
// ==========================================
// 职责: LockedEvent 实体 + 各类别乘数推导规则
// 红线: 锁定事件只属于一个类别; 乘数在锁定时确定, 之后不再变化
// ==========================================

use crate::domain::scenario::PendingEventSettings;
use crate::domain::types::{EventCategory, Month};
use serde::{Deserialize, Serialize};

/// 锁定事件
///
/// 序列化形态与外部服务 `locked_events` 约定一致:
/// `{month, pct, multiplier}`, 自定义事件额外带 `weight`, 促销可带 `spill_pct`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedEvent {
    pub month: Month,
    /// 百分比调整
    #[serde(default)]
    pub pct: f64,
    /// 自定义事件基础权重
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// 促销溢出比例
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spill_pct: Option<f64>,
    /// 推导出的乘数
    pub multiplier: f64,
}

impl LockedEvent {
    /// 促销: 1 + pct/100
    pub fn promotion(month: Month, pct: f64) -> Self {
        Self {
            month,
            pct,
            weight: None,
            spill_pct: None,
            multiplier: 1.0 + pct / 100.0,
        }
    }

    /// 短缺: 1 + pct/100, 上限 1.0
    pub fn shortage(month: Month, pct: f64) -> Self {
        Self {
            month,
            pct,
            weight: None,
            spill_pct: None,
            multiplier: (1.0 + pct / 100.0).min(1.0),
        }
    }

    /// 法规: 1 + pct/100, 上限 1.0
    pub fn regulation(month: Month, pct: f64) -> Self {
        Self {
            month,
            pct,
            weight: None,
            spill_pct: None,
            multiplier: (1.0 + pct / 100.0).min(1.0),
        }
    }

    /// 自定义: weight × (1 + pct/100)
    pub fn custom(month: Month, weight: f64, pct: f64) -> Self {
        Self {
            month,
            pct,
            weight: Some(weight),
            spill_pct: None,
            multiplier: weight * (1.0 + pct / 100.0),
        }
    }

    /// 由类别的待定设置推导锁定事件
    ///
    /// # 返回
    /// - None: 待定设置未选择月份
    pub fn from_pending(category: EventCategory, settings: &PendingEventSettings) -> Option<Self> {
        let month = settings.month?;
        let event = match category {
            EventCategory::Promotion => {
                let mut event = LockedEvent::promotion(month, settings.pct);
                event.spill_pct = settings.spill_pct;
                event
            }
            EventCategory::Shortage => LockedEvent::shortage(month, settings.pct),
            EventCategory::Regulation => LockedEvent::regulation(month, settings.pct),
            EventCategory::Custom => {
                LockedEvent::custom(month, settings.weight.unwrap_or(1.0), settings.pct)
            }
        };
        Some(event)
    }
}

// ==========================================
// LockedEventSet - 按类别分组的锁定事件
// ==========================================
// 每个类别内保持插入顺序（仅用于展示）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LockedEventSet {
    #[serde(rename = "Promo", default)]
    pub promotion: Vec<LockedEvent>,
    #[serde(rename = "Shortage", default)]
    pub shortage: Vec<LockedEvent>,
    #[serde(rename = "Regulation", default)]
    pub regulation: Vec<LockedEvent>,
    #[serde(rename = "Custom", default)]
    pub custom: Vec<LockedEvent>,
}

impl LockedEventSet {
    pub fn events(&self, category: EventCategory) -> &[LockedEvent] {
        match category {
            EventCategory::Promotion => &self.promotion,
            EventCategory::Shortage => &self.shortage,
            EventCategory::Regulation => &self.regulation,
            EventCategory::Custom => &self.custom,
        }
    }

    pub(crate) fn events_mut(&mut self, category: EventCategory) -> &mut Vec<LockedEvent> {
        match category {
            EventCategory::Promotion => &mut self.promotion,
            EventCategory::Shortage => &mut self.shortage,
            EventCategory::Regulation => &mut self.regulation,
            EventCategory::Custom => &mut self.custom,
        }
    }

    pub fn total(&self) -> usize {
        EventCategory::ALL
            .iter()
            .map(|c| self.events(*c).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locked_set_serializes_all_categories() {
        let mut set = LockedEventSet::default();
        set.events_mut(EventCategory::Custom)
            .push(LockedEvent::custom(Month::Sep, 1.0, 0.0));
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["Promo"].as_array().unwrap().len(), 0);
        assert_eq!(json["Custom"].as_array().unwrap().len(), 1);
        assert_eq!(set.total(), 1);
    }

    #[test]
    fn test_multiplier_rules() {
        assert!((LockedEvent::promotion(Month::Jun, 15.0).multiplier - 1.15).abs() < 1e-12);
        assert_eq!(LockedEvent::shortage(Month::Feb, 20.0).multiplier, 1.0);
        assert!((LockedEvent::regulation(Month::Feb, -10.0).multiplier - 0.9).abs() < 1e-12);
        assert!((LockedEvent::custom(Month::Oct, 2.0, 10.0).multiplier - 2.2).abs() < 1e-12);
    }

    #[test]
    fn test_from_pending_requires_month() {
        let mut settings = PendingEventSettings::promotion_default();
        assert!(LockedEvent::from_pending(EventCategory::Promotion, &settings).is_none());

        settings.month = Some(Month::Apr);
        settings.pct = 5.0;
        let event = LockedEvent::from_pending(EventCategory::Promotion, &settings).unwrap();
        assert_eq!(event.month, Month::Apr);
        assert_eq!(event.spill_pct, Some(10.0));
    }

    #[test]
    fn test_wire_shape() {
        let event = LockedEvent::regulation(Month::Jan, -5.0);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["month"], "Jan");
        assert!(json.get("weight").is_none());
    }
}
