// ==========================================
// 汇总与 CSV 导出测试
// ==========================================

use forecast_scenario::domain::{AppliedFactor, MonthlySeries, SimulationResult};
use forecast_scenario::engine::{
    summarize, to_export_rows, valid_month_range, write_csv_file, ExportContext, CSV_HEADER,
};
use forecast_scenario::{MarketShareMode, Month};
use std::collections::BTreeMap;
use tempfile::TempDir;

fn promo_result() -> (SimulationResult, MonthlySeries) {
    let baseline = MonthlySeries::from_values(&[1000.0; 12]);
    let mut simulated = vec![Some(1000.0); 12];
    simulated[Month::Jun.index()] = Some(1150.0);

    let result = SimulationResult {
        simulated: MonthlySeries::new(simulated),
        final_multipliers: BTreeMap::from([(Month::Jun, 1.15)]),
        applied_details: BTreeMap::from([(
            Month::Jun,
            vec![AppliedFactor("Locked_Promo".to_string(), 1.15)],
        )]),
        ms_adjustments: BTreeMap::new(),
        exceeded_months: Vec::new(),
    };
    (result, baseline)
}

#[test]
fn test_write_csv_file_round_trips_through_reader() {
    let (result, baseline) = promo_result();
    let ctx = ExportContext {
        product: "RA",
        aps_class: Some("Split, Ductless"),
        year: 2025,
        ms_mode: MarketShareMode::Historical,
    };
    let rows = to_export_rows(&ctx, &result, &baseline);

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("simulation_RA_Split_2025.csv");
    write_csv_file(&path, &rows).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(headers, CSV_HEADER.to_vec());

    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 12);

    // 含逗号的类别名被正确引用
    assert_eq!(&records[0][1], "Split, Ductless");
    assert_eq!(&records[0][7], "historical");

    let jun = &records[Month::Jun.index()];
    assert_eq!(&jun[3], "Jun");
    assert_eq!(&jun[5], "1.1500");
    assert_eq!(&jun[8], "1150.00");
    assert_eq!(&jun[9], "15.00");
    assert_eq!(&jun[10], "Locked_Promo:1.1500");

    let jan = &records[0];
    assert_eq!(&jan[6], "1.0000");
    assert_eq!(&jan[10], "None");
}

#[test]
fn test_summary_of_promotion_result() {
    let (result, baseline) = promo_result();
    let stats = summarize(&result.simulated, &baseline);

    assert_eq!(stats.months_counted, 12);
    assert!((stats.total_simulated - 12_150.0).abs() < 1e-9);
    assert!((stats.delta_percent - 1.25).abs() < 1e-9);
}

#[test]
fn test_valid_month_range_skips_leading_and_trailing_gaps() {
    let mut values = vec![None; 12];
    values[2] = Some(0.0);
    values[3] = Some(5.0);
    values[8] = Some(7.0);
    values[10] = Some(0.0);

    assert_eq!(valid_month_range(&MonthlySeries::new(values)), (Month::Apr, Month::Sep));
    assert_eq!(valid_month_range(&MonthlySeries::default()), (Month::Jan, Month::Dec));
}
