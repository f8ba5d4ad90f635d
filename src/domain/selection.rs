// ==========================================
// 预测情景模拟 - 选择键
// ==========================================
// 职责: 产品/APS 类别/年份 选择, 决定哪些序列与锁定事件"在范围内"
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 清理 APS 类别输入: 空串 / "null" / "undefined" 视为未选择（产品合计）
pub fn clean_aps_class(raw: Option<&str>) -> Option<String> {
    match raw.map(str::trim) {
        None | Some("") | Some("null") | Some("undefined") => None,
        Some(s) => Some(s.to_string()),
    }
}

/// 导出/展示用的类别名称
pub const PRODUCT_TOTAL_LABEL: &str = "Product Total";

// ==========================================
// SelectionKey - 完整选择键
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionKey {
    pub product: String,
    pub aps_class: Option<String>,
    pub year: i32,
}

impl SelectionKey {
    pub fn new(product: impl Into<String>, aps_class: Option<String>, year: i32) -> Self {
        Self {
            product: product.into(),
            aps_class,
            year,
        }
    }

    pub fn class_label(&self) -> &str {
        self.aps_class.as_deref().unwrap_or(PRODUCT_TOTAL_LABEL)
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.product,
            self.aps_class.as_deref().unwrap_or("null"),
            self.year
        )
    }
}

// ==========================================
// Selection - 正在编辑中的选择（各项可缺失）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub product: Option<String>,
    pub aps_class: Option<String>,
    pub year: Option<i32>,
}

impl Selection {
    /// 产品与年份均已选择时给出完整键
    pub fn key(&self) -> Option<SelectionKey> {
        match (&self.product, self.year) {
            (Some(product), Some(year)) => Some(SelectionKey {
                product: product.clone(),
                aps_class: self.aps_class.clone(),
                year,
            }),
            _ => None,
        }
    }

    /// 切换产品: 类别与年份同时复位
    ///
    /// # 返回
    /// - true: 产品确实发生变化
    pub fn switch_product(&mut self, product: &str) -> bool {
        if self.product.as_deref() == Some(product) {
            return false;
        }
        self.product = Some(product.to_string());
        self.aps_class = None;
        self.year = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_aps_class() {
        assert_eq!(clean_aps_class(None), None);
        assert_eq!(clean_aps_class(Some("")), None);
        assert_eq!(clean_aps_class(Some("null")), None);
        assert_eq!(clean_aps_class(Some("undefined")), None);
        assert_eq!(clean_aps_class(Some("CN_1PH")), Some("CN_1PH".to_string()));
    }

    #[test]
    fn test_switch_product_resets_class_and_year() {
        let mut selection = Selection {
            product: Some("AH".to_string()),
            aps_class: Some("ACNF".to_string()),
            year: Some(2025),
        };
        assert!(!selection.switch_product("AH"));
        assert_eq!(selection.year, Some(2025));

        assert!(selection.switch_product("CL"));
        assert_eq!(selection.aps_class, None);
        assert_eq!(selection.year, None);
        assert!(selection.key().is_none());
    }

    #[test]
    fn test_key_display() {
        let key = SelectionKey::new("CN", None, 2024);
        assert_eq!(key.to_string(), "CN-null-2024");
        assert_eq!(key.class_label(), "Product Total");
    }
}
