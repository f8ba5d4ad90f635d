// ==========================================
// 预测情景模拟 - 会话运行时
// ==========================================
// 职责: 单个 tokio 任务独占 ScenarioSession, 串行处理
//       命令、防抖计时与模拟响应
// 说明: 计时与网络调用是仅有的两个挂起点
//       新计时替换旧计时; 新请求不取消在途调用, 其响应由序号判定过期
// ==========================================

use crate::api::dto::ExportResponse;
use crate::api::error::ApiResult;
use crate::api::forecast_service::ForecastService;
use crate::app::session::{ExportFile, ScenarioSession, SessionError, SessionResult, SessionView};
use crate::domain::simulation::SimulationResult;
use crate::domain::types::EventCategory;
use crate::engine::debounce::DebounceToken;
use crate::engine::locked_events::LockedEventAction;
use crate::engine::orchestrator::TimerOutcome;
use crate::engine::scenario_params::ParameterPatch;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// 命令通道容量
const COMMAND_BUFFER: usize = 64;

// ==========================================
// 命令
// ==========================================

#[derive(Debug, Clone)]
pub enum SessionCommand {
    LoadProducts,
    SelectProduct(String),
    SelectClass(Option<String>),
    SelectYear(i32),
    Locked(LockedEventAction),
    LockPending(EventCategory),
    UpdateParams(ParameterPatch),
    ResetParams,
    DismissWarnings,
    SetWarningsEnabled(bool),
    ExportCsv,
    ExportViaService,
}

impl SessionCommand {
    pub fn name(&self) -> &'static str {
        match self {
            SessionCommand::LoadProducts => "LoadProducts",
            SessionCommand::SelectProduct(_) => "SelectProduct",
            SessionCommand::SelectClass(_) => "SelectClass",
            SessionCommand::SelectYear(_) => "SelectYear",
            SessionCommand::Locked(_) => "Locked",
            SessionCommand::LockPending(_) => "LockPending",
            SessionCommand::UpdateParams(_) => "UpdateParams",
            SessionCommand::ResetParams => "ResetParams",
            SessionCommand::DismissWarnings => "DismissWarnings",
            SessionCommand::SetWarningsEnabled(_) => "SetWarningsEnabled",
            SessionCommand::ExportCsv => "ExportCsv",
            SessionCommand::ExportViaService => "ExportViaService",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandReply {
    Done,
    Csv(ExportFile),
    ServerCsv(ExportResponse),
}

struct Envelope {
    command: SessionCommand,
    reply: oneshot::Sender<SessionResult<CommandReply>>,
}

/// 运行时内部事件
enum RuntimeEvent {
    TimerFired(DebounceToken),
    SimulationCompleted {
        seq: u64,
        result: ApiResult<SimulationResult>,
    },
}

// ==========================================
// SessionHandle - 对外句柄
// ==========================================
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Envelope>,
    view: watch::Receiver<SessionView>,
}

impl SessionHandle {
    /// 发送命令并等待处理结果
    pub async fn send(&self, command: SessionCommand) -> SessionResult<CommandReply> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Envelope { command, reply })
            .await
            .map_err(|_| SessionError::RuntimeClosed)?;
        response.await.map_err(|_| SessionError::RuntimeClosed)?
    }

    pub async fn load_products(&self) -> SessionResult<()> {
        self.send(SessionCommand::LoadProducts).await.map(|_| ())
    }

    pub async fn select_product(&self, product: impl Into<String>) -> SessionResult<()> {
        self.send(SessionCommand::SelectProduct(product.into())).await.map(|_| ())
    }

    pub async fn select_class(&self, aps_class: Option<String>) -> SessionResult<()> {
        self.send(SessionCommand::SelectClass(aps_class)).await.map(|_| ())
    }

    pub async fn select_year(&self, year: i32) -> SessionResult<()> {
        self.send(SessionCommand::SelectYear(year)).await.map(|_| ())
    }

    pub async fn dispatch_locked(&self, action: LockedEventAction) -> SessionResult<()> {
        self.send(SessionCommand::Locked(action)).await.map(|_| ())
    }

    pub async fn lock_pending(&self, category: EventCategory) -> SessionResult<()> {
        self.send(SessionCommand::LockPending(category)).await.map(|_| ())
    }

    pub async fn update_params(&self, patch: ParameterPatch) -> SessionResult<()> {
        self.send(SessionCommand::UpdateParams(patch)).await.map(|_| ())
    }

    pub async fn export_csv(&self) -> SessionResult<ExportFile> {
        match self.send(SessionCommand::ExportCsv).await? {
            CommandReply::Csv(file) => Ok(file),
            _ => Err(SessionError::NothingToExport),
        }
    }

    pub async fn export_via_service(&self) -> SessionResult<ExportResponse> {
        match self.send(SessionCommand::ExportViaService).await? {
            CommandReply::ServerCsv(response) => Ok(response),
            _ => Err(SessionError::NothingToExport),
        }
    }

    /// 最新视图
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// 等待视图满足条件
    pub async fn wait_for<F>(&self, predicate: F) -> SessionResult<SessionView>
    where
        F: FnMut(&SessionView) -> bool,
    {
        let mut receiver = self.view.clone();
        let view = receiver
            .wait_for(predicate)
            .await
            .map_err(|_| SessionError::RuntimeClosed)?;
        Ok(view.clone())
    }
}

// ==========================================
// SessionRuntime
// ==========================================
pub struct SessionRuntime<S: ForecastService + 'static> {
    session: ScenarioSession<S>,
    events_tx: mpsc::UnboundedSender<RuntimeEvent>,
    timer: Option<JoinHandle<()>>,
}

impl<S: ForecastService + 'static> SessionRuntime<S> {
    /// 启动运行时任务
    ///
    /// # 返回
    /// - 句柄: 全部句柄被丢弃后任务退出
    /// - JoinHandle: 运行时任务
    pub fn spawn(mut session: ScenarioSession<S>) -> (SessionHandle, JoinHandle<()>) {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(session.view());

        let runtime = Self {
            session,
            events_tx,
            timer: None,
        };
        let task = tokio::spawn(runtime.run(commands_rx, events_rx, view_tx));

        (
            SessionHandle {
                commands: commands_tx,
                view: view_rx,
            },
            task,
        )
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Envelope>,
        mut events: mpsc::UnboundedReceiver<RuntimeEvent>,
        view: watch::Sender<SessionView>,
    ) {
        info!("会话运行时已启动");
        loop {
            tokio::select! {
                envelope = commands.recv() => {
                    let Some(Envelope { command, reply }) = envelope else {
                        break;
                    };
                    let result = self.handle_command(command).await;
                    view.send_replace(self.session.view());
                    // 调用方可能已放弃等待
                    let _ = reply.send(result);
                }
                Some(event) = events.recv() => {
                    self.handle_event(event);
                    view.send_replace(self.session.view());
                }
            }
        }

        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        info!("会话运行时已退出");
    }

    async fn handle_command(&mut self, command: SessionCommand) -> SessionResult<CommandReply> {
        debug!(command = command.name(), "处理会话命令");
        let token = match command {
            SessionCommand::LoadProducts => self.session.load_products().await?,
            SessionCommand::SelectProduct(product) => self.session.select_product(&product).await?,
            SessionCommand::SelectClass(aps_class) => {
                self.session.select_class(aps_class.as_deref()).await?
            }
            SessionCommand::SelectYear(year) => self.session.select_year(year),
            SessionCommand::Locked(action) => self.session.dispatch_locked(action)?,
            SessionCommand::LockPending(category) => Some(self.session.lock_pending(category)?),
            SessionCommand::UpdateParams(patch) => Some(self.session.update_params(patch)),
            SessionCommand::ResetParams => Some(self.session.reset_params()),
            SessionCommand::DismissWarnings => {
                self.session.dismiss_warnings();
                None
            }
            SessionCommand::SetWarningsEnabled(enabled) => {
                self.session.set_warnings_enabled(enabled);
                None
            }
            SessionCommand::ExportCsv => return Ok(CommandReply::Csv(self.session.export_csv()?)),
            SessionCommand::ExportViaService => {
                return Ok(CommandReply::ServerCsv(self.session.export_via_service().await?))
            }
        };

        if let Some(token) = token {
            self.schedule_timer(token);
        }
        Ok(CommandReply::Done)
    }

    fn handle_event(&mut self, event: RuntimeEvent) {
        match event {
            RuntimeEvent::TimerFired(token) => {
                if let TimerOutcome::Issued(issued) = self.session.on_timer_fired(token) {
                    let service: Arc<S> = self.session.service();
                    let events_tx = self.events_tx.clone();
                    let seq = issued.seq;
                    tokio::spawn(async move {
                        let result = service.simulate(&issued.request).await;
                        // 运行时退出后丢弃
                        let _ = events_tx.send(RuntimeEvent::SimulationCompleted { seq, result });
                    });
                }
            }
            RuntimeEvent::SimulationCompleted { seq, result } => {
                self.session.on_simulation_response(seq, result);
            }
        }
    }

    /// 替换防抖计时
    fn schedule_timer(&mut self, token: DebounceToken) {
        if let Some(previous) = self.timer.take() {
            previous.abort();
        }
        let delay: Duration = self.session.orchestrator().debounce_delay();
        let events_tx = self.events_tx.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events_tx.send(RuntimeEvent::TimerFired(token));
        }));
    }
}
