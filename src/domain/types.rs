// ==========================================
// 预测情景模拟 - 领域类型定义
// ==========================================
// 职责: 月份、事件类别、市场份额模式等封闭枚举
// 红线: 月份固定 12 个标签, 无本地化变体
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 月份 (Month)
// ==========================================
// 顺序: Jan < Feb < ... < Dec, 作为所有按月映射的键
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    /// 日历顺序的全部月份
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    /// 0 基下标 (Jan = 0)
    pub fn index(self) -> usize {
        self as usize
    }

    /// 由 0 基下标构造
    pub fn from_index(idx: usize) -> Option<Month> {
        Month::ALL.get(idx).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Month::Jan => "Jan",
            Month::Feb => "Feb",
            Month::Mar => "Mar",
            Month::Apr => "Apr",
            Month::May => "May",
            Month::Jun => "Jun",
            Month::Jul => "Jul",
            Month::Aug => "Aug",
            Month::Sep => "Sep",
            Month::Oct => "Oct",
            Month::Nov => "Nov",
            Month::Dec => "Dec",
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Month::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == trimmed)
            .ok_or_else(|| format!("未知月份: {}", trimmed))
    }
}

// ==========================================
// 事件类别 (Event Category)
// ==========================================
// 封闭集合; 序列化名与外部服务一致 (Promo/Shortage/Regulation/Custom)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    #[serde(rename = "Promo")]
    Promotion,
    Shortage,
    Regulation,
    Custom,
}

impl EventCategory {
    pub const ALL: [EventCategory; 4] = [
        EventCategory::Promotion,
        EventCategory::Shortage,
        EventCategory::Regulation,
        EventCategory::Custom,
    ];

    /// 每个类别可锁定的事件上限
    pub const MAX_LOCKED: usize = 3;

    /// 外部服务使用的标识
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Promotion => "Promo",
            EventCategory::Shortage => "Shortage",
            EventCategory::Regulation => "Regulation",
            EventCategory::Custom => "Custom",
        }
    }

    /// 模拟结果 applied_details 中锁定事件的名称
    pub fn locked_label(&self) -> &'static str {
        match self {
            EventCategory::Promotion => "Locked_Promo",
            EventCategory::Shortage => "Locked_Shortage",
            EventCategory::Regulation => "Locked_Regulation",
            EventCategory::Custom => "Locked_Custom",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EventCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "promo" | "promotion" => Ok(EventCategory::Promotion),
            "shortage" => Ok(EventCategory::Shortage),
            "regulation" => Ok(EventCategory::Regulation),
            "custom" => Ok(EventCategory::Custom),
            other => Err(format!("未知事件类别: {}", other)),
        }
    }
}

// ==========================================
// 市场份额模式 (Market Share Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketShareMode {
    Relative,    // 相对变化
    Historical,  // 历史趋势
    Competitive, // 竞争情报
    Macro,       // 宏观情景
}

impl MarketShareMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketShareMode::Relative => "relative",
            MarketShareMode::Historical => "historical",
            MarketShareMode::Competitive => "competitive",
            MarketShareMode::Macro => "macro",
        }
    }
}

impl Default for MarketShareMode {
    fn default() -> Self {
        MarketShareMode::Relative
    }
}

impl fmt::Display for MarketShareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MarketShareMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "relative" => Ok(MarketShareMode::Relative),
            "historical" => Ok(MarketShareMode::Historical),
            "competitive" => Ok(MarketShareMode::Competitive),
            "macro" => Ok(MarketShareMode::Macro),
            other => Err(format!("未知市场份额模式: {}", other)),
        }
    }
}

// ==========================================
// 竞争情报事件形态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitivePattern {
    Single,   // 单次冲击
    Gradual,  // 渐进转移
    Recovery, // 损失后恢复
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_order_and_index() {
        assert!(Month::Jan < Month::Dec);
        assert_eq!(Month::Jun.index(), 5);
        assert_eq!(Month::from_index(11), Some(Month::Dec));
        assert_eq!(Month::from_index(12), None);
        assert_eq!("Mar".parse::<Month>().unwrap(), Month::Mar);
        assert!("March".parse::<Month>().is_err());
    }

    #[test]
    fn test_event_category_wire_names() {
        let json = serde_json::to_string(&EventCategory::Promotion).unwrap();
        assert_eq!(json, "\"Promo\"");
        let back: EventCategory = serde_json::from_str("\"Shortage\"").unwrap();
        assert_eq!(back, EventCategory::Shortage);
        assert_eq!("promotion".parse::<EventCategory>().unwrap(), EventCategory::Promotion);
    }

    #[test]
    fn test_market_share_mode_serde() {
        let json = serde_json::to_string(&MarketShareMode::Competitive).unwrap();
        assert_eq!(json, "\"competitive\"");
        assert_eq!(MarketShareMode::default(), MarketShareMode::Relative);
    }
}
