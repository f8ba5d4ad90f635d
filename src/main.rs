// ==========================================
// 预测情景模拟 - 命令行入口
// ==========================================
// 用途: 连接外部预测服务, 加载默认产品并输出一次模拟汇总
// 用法: forecast-scenario [产品代码] [APS 类别]
// ==========================================

use anyhow::{anyhow, Context, Result};
use forecast_scenario::app::{ScenarioSession, SessionRuntime};
use forecast_scenario::engine::{OptionalEventPublisher, OrchestratorStatus};
use forecast_scenario::{logging, HttpForecastService, ServiceConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init().map_err(|e| anyhow!("日志系统初始化失败: {}", e))?;

    tracing::info!("==================================================");
    tracing::info!("{} - 系统版本: {}", forecast_scenario::APP_NAME, forecast_scenario::VERSION);
    tracing::info!("==================================================");

    let config = ServiceConfig::from_env().context("读取服务配置失败")?;
    let service = Arc::new(HttpForecastService::new(&config).context("创建 HTTP 客户端失败")?);
    let session = ScenarioSession::new(service, config, OptionalEventPublisher::none());
    let (handle, task) = SessionRuntime::spawn(session);

    let mut args = std::env::args().skip(1);
    let product = args.next();
    let aps_class = args.next();

    handle.load_products().await.context("加载产品目录失败")?;
    if let Some(product) = product {
        handle.select_product(product).await?;
    }
    if aps_class.is_some() {
        handle.select_class(aps_class).await?;
    }

    let view = handle
        .wait_for(|v| !v.simulation.status.is_busy())
        .await?;

    match view.simulation.status {
        OrchestratorStatus::Settled => {
            if let Some(summary) = view.summary {
                println!(
                    "selection={:?} avg_simulated={:.2} avg_baseline={:.2} delta={:.2}%",
                    view.selection, summary.avg_simulated, summary.avg_baseline, summary.delta_percent
                );
            }
            let file = handle.export_csv().await?;
            println!("{}", file.filename);
            println!("{}", file.content);
        }
        OrchestratorStatus::Failed => {
            if let Some(error) = view.simulation.error {
                eprintln!("模拟失败: {}", error);
            }
        }
        status => {
            eprintln!("未发出模拟请求: status={} reason={:?}", status.as_str(), view.simulation.last_skip);
        }
    }

    drop(handle);
    task.await.context("会话运行时异常退出")?;
    Ok(())
}
