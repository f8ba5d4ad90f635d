// ==========================================
// 预测情景模拟 - 月度序列与产品数据
// ==========================================
// 职责: 基线/实际/交付序列、权重列、产品目录的数据形态
// 说明: 外部服务以 year -> 12 个数值 的映射下发, 缺失月份为 null
// ==========================================

use crate::domain::types::Month;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// 把 JSON null 当作缺省值读取
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// 取有效数值（非 null、非 NaN、有限）
pub fn numeric(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

// ==========================================
// MonthlySeries - 单年 12 个月的数值
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthlySeries(pub Vec<Option<f64>>);

impl MonthlySeries {
    pub fn new(values: Vec<Option<f64>>) -> Self {
        Self(values)
    }

    /// 由 12 个确定值构造
    pub fn from_values(values: &[f64]) -> Self {
        Self(values.iter().map(|v| Some(*v)).collect())
    }

    /// 某月的有效数值
    pub fn get(&self, month: Month) -> Option<f64> {
        numeric(self.0.get(month.index()).copied().flatten())
    }

    /// 所有有效数值（保持月份顺序）
    pub fn numeric_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().filter_map(|v| numeric(*v))
    }

    pub fn has_numeric(&self) -> bool {
        self.numeric_values().next().is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Option<f64>] {
        &self.0
    }
}

/// 年份 -> 月度序列
pub type YearlySeries = BTreeMap<i32, MonthlySeries>;

// ==========================================
// WeightColumn - 权重列
// ==========================================
// 权重表的一列, 可能是 12 个月的数组, 也可能是单一标量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeightColumn {
    Monthly(Vec<Option<f64>>),
    Scalar(f64),
}

impl WeightColumn {
    /// 某月的权重, 无法解析时为 1.0
    pub fn multiplier_for(&self, month: Month) -> f64 {
        match self {
            WeightColumn::Monthly(values) => {
                numeric(values.get(month.index()).copied().flatten()).unwrap_or(1.0)
            }
            WeightColumn::Scalar(v) if v.is_finite() => *v,
            WeightColumn::Scalar(_) => 1.0,
        }
    }
}

pub type Weights = BTreeMap<String, WeightColumn>;

// ==========================================
// ProductCatalog - 产品目录
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductCatalog {
    #[serde(default, deserialize_with = "null_as_default")]
    pub products: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub aps_classes: BTreeMap<String, Vec<String>>,
}

impl ProductCatalog {
    /// 产品下的 APS 类别
    pub fn classes_for(&self, product: &str) -> &[String] {
        self.aps_classes
            .get(product)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

// ==========================================
// ProductData - 单个产品(+类别)的全部序列
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub baseline: YearlySeries,
    #[serde(default, deserialize_with = "null_as_default")]
    pub actuals: YearlySeries,
    #[serde(default, deserialize_with = "null_as_default")]
    pub delivered: YearlySeries,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weights: Weights,
    #[serde(default, deserialize_with = "null_as_default")]
    pub market_share: YearlySeries,
    /// 服务端按降序下发（最近年份在前）
    #[serde(default, deserialize_with = "null_as_default")]
    pub available_years: Vec<i32>,
}

impl ProductData {
    pub fn baseline_for(&self, year: i32) -> Option<&MonthlySeries> {
        self.baseline.get(&year)
    }

    pub fn actuals_for(&self, year: i32) -> Option<&MonthlySeries> {
        self.actuals.get(&year)
    }

    pub fn delivered_for(&self, year: i32) -> Option<&MonthlySeries> {
        self.delivered.get(&year)
    }

    /// 默认选中的年份（最近一年）
    pub fn default_year(&self) -> Option<i32> {
        self.available_years.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_data_tolerates_nulls() {
        let json = r#"{
            "success": true,
            "baseline": {"2025": [100, 110, null, 90, 95, 100, 100, 100, 100, 100, 100, 100]},
            "actuals": null,
            "delivered": {},
            "weights": {"Trend": [1.01, 1.02], "Flat": 0.9},
            "market_share": null,
            "available_years": [2025, 2024]
        }"#;
        let data: ProductData = serde_json::from_str(json).unwrap();

        let baseline = data.baseline_for(2025).unwrap();
        assert_eq!(baseline.get(Month::Feb), Some(110.0));
        assert_eq!(baseline.get(Month::Mar), None);
        assert_eq!(baseline.numeric_values().count(), 11);
        assert!(data.actuals.is_empty());
        assert_eq!(data.default_year(), Some(2025));

        assert_eq!(data.weights["Trend"].multiplier_for(Month::Feb), 1.02);
        assert_eq!(data.weights["Trend"].multiplier_for(Month::Dec), 1.0);
        assert_eq!(data.weights["Flat"].multiplier_for(Month::Jul), 0.9);
    }

    #[test]
    fn test_catalog_classes_for_unknown_product() {
        let catalog = ProductCatalog {
            products: vec!["AH".to_string()],
            aps_classes: BTreeMap::from([("AH".to_string(), vec!["ACNF".to_string()])]),
        };
        assert_eq!(catalog.classes_for("AH").len(), 1);
        assert!(catalog.classes_for("CL").is_empty());
    }
}
