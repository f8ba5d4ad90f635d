// ==========================================
// 预测情景模拟 - 汇总与导出
// ==========================================
// 职责: 由模拟结果 + 基线派生汇总统计与导出行（CSV）
// 红线: 纯函数, 不依赖编排器状态
// 红线: 缺失月份不计入汇总（不按 0 计）
// ==========================================

use crate::domain::selection::PRODUCT_TOTAL_LABEL;
use crate::domain::series::{numeric, MonthlySeries};
use crate::domain::simulation::SimulationResult;
use crate::domain::types::{MarketShareMode, Month};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// 导出文件表头
pub const CSV_HEADER: [&str; 11] = [
    "Product",
    "APS_Class",
    "Year",
    "Month",
    "Daikin_Baseline",
    "Event_Multiplier",
    "MS_Adjustment",
    "MS_Mode",
    "Simulated",
    "Delta_vs_Baseline_Pct",
    "Applied_Events",
];

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("文件写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 内容不是合法 UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

// ==========================================
// 汇总统计
// ==========================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub avg_simulated: f64,
    pub total_simulated: f64,
    pub avg_baseline: f64,
    pub total_baseline: f64,
    /// 基线合计为 0 时取 0
    pub delta_percent: f64,
    /// 参与统计的月份数
    pub months_counted: usize,
}

/// 汇总模拟值与基线
///
/// 只统计两者都为数值的月份
pub fn summarize(simulated: &MonthlySeries, baseline: &MonthlySeries) -> SummaryStats {
    let pairs: Vec<(f64, f64)> = Month::ALL
        .iter()
        .filter_map(|m| match (simulated.get(*m), baseline.get(*m)) {
            (Some(s), Some(b)) => Some((s, b)),
            _ => None,
        })
        .collect();

    if pairs.is_empty() {
        return SummaryStats::default();
    }

    let count = pairs.len();
    let total_simulated: f64 = pairs.iter().map(|(s, _)| s).sum();
    let total_baseline: f64 = pairs.iter().map(|(_, b)| b).sum();

    SummaryStats {
        avg_simulated: total_simulated / count as f64,
        total_simulated,
        avg_baseline: total_baseline / count as f64,
        total_baseline,
        delta_percent: percent_change(total_simulated, total_baseline),
        months_counted: count,
    }
}

fn percent_change(value: f64, base: f64) -> f64 {
    if base == 0.0 {
        0.0
    } else {
        (value - base) / base * 100.0
    }
}

// ==========================================
// 导出行
// ==========================================

/// 导出上下文（当前选择与模式）
#[derive(Debug, Clone, Copy)]
pub struct ExportContext<'a> {
    pub product: &'a str,
    pub aps_class: Option<&'a str>,
    pub year: i32,
    pub ms_mode: MarketShareMode,
}

impl ExportContext<'_> {
    pub fn class_label(&self) -> &str {
        self.aps_class.unwrap_or(PRODUCT_TOTAL_LABEL)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub product: String,
    pub aps_class: String,
    pub year: i32,
    pub month: Month,
    pub baseline: f64,
    pub event_multiplier: f64,
    pub ms_adjustment: f64,
    pub ms_mode: MarketShareMode,
    pub simulated: f64,
    pub delta_pct: f64,
    pub applied_events: String,
}

impl ExportRow {
    /// 固定小数位的 CSV 记录
    pub fn to_record(&self) -> [String; 11] {
        [
            self.product.clone(),
            self.aps_class.clone(),
            self.year.to_string(),
            self.month.to_string(),
            format!("{:.2}", self.baseline),
            format!("{:.4}", self.event_multiplier),
            format!("{:.4}", self.ms_adjustment),
            self.ms_mode.to_string(),
            format!("{:.2}", self.simulated),
            format!("{:.2}", self.delta_pct),
            self.applied_events.clone(),
        ]
    }
}

/// 生效因子文本: `name:1.1500; name:0.9000` / `None`
fn applied_events_text(result: &SimulationResult, month: Month) -> String {
    let factors = result.applied_for(month);
    if factors.is_empty() {
        return "None".to_string();
    }
    factors
        .iter()
        .map(|f| format!("{}:{:.4}", f.name(), f.multiplier()))
        .collect::<Vec<_>>()
        .join("; ")
}

/// 按日历顺序每月一行
pub fn to_export_rows(
    ctx: &ExportContext<'_>,
    result: &SimulationResult,
    baseline: &MonthlySeries,
) -> Vec<ExportRow> {
    Month::ALL
        .iter()
        .map(|&month| {
            let base = baseline.get(month).unwrap_or(0.0);
            let simulated = result.simulated_for(month).unwrap_or(0.0);
            ExportRow {
                product: ctx.product.to_string(),
                aps_class: ctx.class_label().to_string(),
                year: ctx.year,
                month,
                baseline: base,
                event_multiplier: numeric(Some(result.event_multiplier(month))).unwrap_or(1.0),
                ms_adjustment: numeric(Some(result.ms_adjustment(month))).unwrap_or(1.0),
                ms_mode: ctx.ms_mode,
                simulated,
                delta_pct: percent_change(simulated, base),
                applied_events: applied_events_text(result, month),
            }
        })
        .collect()
}

fn write_rows<W: std::io::Write>(writer: W, rows: &[ExportRow]) -> Result<W, ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer.write_record(CSV_HEADER)?;
    for row in rows {
        csv_writer.write_record(row.to_record())?;
    }
    csv_writer.flush()?;
    csv_writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// 生成 CSV 文本（1 行表头 + 12 行数据）
pub fn to_csv(rows: &[ExportRow]) -> Result<String, ExportError> {
    let buffer = write_rows(Vec::new(), rows)?;
    Ok(String::from_utf8(buffer)?)
}

/// 写入 CSV 文件
pub fn write_csv_file(path: &Path, rows: &[ExportRow]) -> Result<(), ExportError> {
    let file = std::fs::File::create(path)?;
    write_rows(file, rows)?;
    debug!(path = %path.display(), rows = rows.len(), "CSV 已写入");
    Ok(())
}

/// 导出文件名: simulation_{product}_{class|total}_{year}.csv
pub fn export_filename(product: &str, aps_class: Option<&str>, year: i32) -> String {
    format!(
        "simulation_{}_{}_{}.csv",
        product,
        aps_class.unwrap_or("total"),
        year
    )
}

/// 有效月份区间: 首个与最后一个正数值的月份; 没有时为全年
pub fn valid_month_range(series: &MonthlySeries) -> (Month, Month) {
    let positive: Vec<Month> = Month::ALL
        .iter()
        .copied()
        .filter(|m| series.get(*m).map(|v| v > 0.0).unwrap_or(false))
        .collect();
    match (positive.first(), positive.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => (Month::Jan, Month::Dec),
    }
}
