// ==========================================
// 预测情景模拟 - 防抖计时器状态机
// ==========================================
// 状态: Idle -> Scheduled(token) -> Fired(token)
// 说明: 尾随防抖, 每次 schedule 生成新 token, 旧 token 触发时被忽略
// 说明: 真正的延时由运行时（tokio）驱动, 这里只判定 token 是否有效
// ==========================================

use std::time::Duration;

/// 默认防抖延时
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DebounceToken(u64);

impl DebounceToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Scheduled(DebounceToken),
    Fired(DebounceToken),
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    state: TimerState,
    next_token: u64,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: TimerState::Idle,
            next_token: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_scheduled(&self) -> bool {
        matches!(self.state, TimerState::Scheduled(_))
    }

    /// (重新)开始计时; 替换 token 即取消上一个未触发的计时
    pub fn schedule(&mut self) -> DebounceToken {
        self.next_token += 1;
        let token = DebounceToken(self.next_token);
        self.state = TimerState::Scheduled(token);
        token
    }

    pub fn cancel(&mut self) {
        if self.is_scheduled() {
            self.state = TimerState::Idle;
        }
    }

    /// 计时到期
    ///
    /// # 返回
    /// - true: token 为当前计时, 状态转为 Fired
    /// - false: token 已被替换或取消
    pub fn fire(&mut self, token: DebounceToken) -> bool {
        match self.state {
            TimerState::Scheduled(current) if current == token => {
                self.state = TimerState::Fired(token);
                true
            }
            _ => false,
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
