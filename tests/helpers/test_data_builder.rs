// ==========================================
// 测试数据构建器
// ==========================================

use forecast_scenario::domain::{MonthlySeries, ProductData};

/// 产品数据构建器
#[derive(Debug, Clone, Default)]
pub struct ProductDataBuilder {
    data: ProductData,
}

impl ProductDataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加某年的基线（同时登记可用年份, 保持降序）
    pub fn baseline(mut self, year: i32, values: &[f64]) -> Self {
        self.data.baseline.insert(year, MonthlySeries::from_values(values));
        self.add_year(year);
        self
    }

    pub fn actuals(mut self, year: i32, values: Vec<Option<f64>>) -> Self {
        self.data.actuals.insert(year, MonthlySeries::new(values));
        self
    }

    pub fn delivered(mut self, year: i32, values: Vec<Option<f64>>) -> Self {
        self.data.delivered.insert(year, MonthlySeries::new(values));
        self
    }

    /// 只登记年份, 不带基线
    pub fn year_without_baseline(mut self, year: i32) -> Self {
        self.add_year(year);
        self
    }

    fn add_year(&mut self, year: i32) {
        if !self.data.available_years.contains(&year) {
            self.data.available_years.push(year);
            self.data.available_years.sort_unstable_by(|a, b| b.cmp(a));
        }
    }

    pub fn build(self) -> ProductData {
        self.data
    }
}

/// 12 个月相同的基线
pub fn flat(value: f64) -> [f64; 12] {
    [value; 12]
}
