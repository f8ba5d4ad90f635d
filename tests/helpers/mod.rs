// ==========================================
// 集成测试辅助
// ==========================================

#![allow(dead_code)]

pub mod mock_service;
pub mod test_data_builder;

use forecast_scenario::app::{ScenarioSession, SessionHandle, SessionRuntime, SessionView};
use forecast_scenario::config::{BuildEnvironment, LockedEventScope, ServiceConfig};
use forecast_scenario::engine::{OptionalEventPublisher, OrchestratorStatus};
pub use mock_service::{compose, MockForecastService};
use std::sync::Arc;
use std::time::Duration;
pub use test_data_builder::{flat, ProductDataBuilder};
use tokio::task::JoinHandle;

pub const DEBOUNCE: Duration = Duration::from_millis(150);

pub fn test_config(scope: LockedEventScope) -> ServiceConfig {
    ServiceConfig {
        locked_event_scope: scope,
        debounce_delay: DEBOUNCE,
        ..ServiceConfig::for_environment(BuildEnvironment::Development)
    }
}

/// 单产品 RA、2025 年、基线全为 value 的服务
pub fn single_product_service(value: f64) -> MockForecastService {
    MockForecastService::new().with_product(
        "RA",
        None,
        ProductDataBuilder::new().baseline(2025, &flat(value)).build(),
    )
}

pub fn new_session(service: Arc<MockForecastService>) -> ScenarioSession<MockForecastService> {
    session_with_scope(service, LockedEventScope::ResetOnProductChange)
}

pub fn session_with_scope(
    service: Arc<MockForecastService>,
    scope: LockedEventScope,
) -> ScenarioSession<MockForecastService> {
    ScenarioSession::new(service, test_config(scope), OptionalEventPublisher::none())
}

pub fn spawn_runtime(service: Arc<MockForecastService>) -> (SessionHandle, JoinHandle<()>) {
    SessionRuntime::spawn(new_session(service))
}

/// 等待指定序号的结果被接受且状态为 Settled
pub async fn wait_settled(handle: &SessionHandle, seq: u64) -> SessionView {
    handle
        .wait_for(|v| {
            v.simulation.status == OrchestratorStatus::Settled
                && v.simulation.accepted_seq == Some(seq)
        })
        .await
        .expect("runtime closed while waiting")
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}
