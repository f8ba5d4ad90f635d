// ==========================================
// 预测情景模拟 - API 传输对象
// ==========================================
// 职责: 导出/年份等接口的请求与响应载荷
// 说明: 产品目录、产品数据、模拟请求/结果直接使用领域类型
// ==========================================

use crate::domain::series::MonthlySeries;
use crate::domain::simulation::{AppliedFactor, SimulationResult};
use crate::domain::types::{MarketShareMode, Month};
use crate::engine::summary::ExportContext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 服务端 CSV 导出请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub product: String,
    pub aps_class: Option<String>,
    pub year: i32,
    pub baseline: MonthlySeries,
    pub simulated: MonthlySeries,
    pub multipliers: BTreeMap<Month, f64>,
    pub ms_adjustments: BTreeMap<Month, f64>,
    pub ms_mode: MarketShareMode,
    pub applied_details: BTreeMap<Month, Vec<AppliedFactor>>,
}

impl ExportRequest {
    /// 由当前选择、结果与基线构造
    pub fn new(ctx: &ExportContext<'_>, result: &SimulationResult, baseline: &MonthlySeries) -> Self {
        Self {
            product: ctx.product.to_string(),
            aps_class: ctx.aps_class.map(str::to_string),
            year: ctx.year,
            baseline: baseline.clone(),
            simulated: result.simulated.clone(),
            multipliers: result.final_multipliers.clone(),
            ms_adjustments: result.ms_adjustments.clone(),
            ms_mode: ctx.ms_mode,
            applied_details: result.applied_details.clone(),
        }
    }
}

/// 服务端 CSV 导出响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportResponse {
    pub csv_content: String,
    pub filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_request_wire_shape() {
        let ctx = ExportContext {
            product: "RA",
            aps_class: Some("ACNF"),
            year: 2025,
            ms_mode: MarketShareMode::Competitive,
        };
        let result = SimulationResult {
            simulated: MonthlySeries::from_values(&[10.0; 12]),
            final_multipliers: BTreeMap::from([(Month::Mar, 0.9)]),
            ..SimulationResult::default()
        };
        let request = ExportRequest::new(&ctx, &result, &MonthlySeries::from_values(&[9.0; 12]));

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["aps_class"], "ACNF");
        assert_eq!(json["ms_mode"], "competitive");
        assert_eq!(json["multipliers"]["Mar"], 0.9);
        assert_eq!(json["simulated"].as_array().unwrap().len(), 12);
    }

    #[test]
    fn test_export_response_ignores_extra_fields() {
        let json = r#"{"success": true, "csv_content": "Product\n", "filename": "simulation_RA_total_2025.csv"}"#;
        let response: ExportResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.filename, "simulation_RA_total_2025.csv");
    }
}
