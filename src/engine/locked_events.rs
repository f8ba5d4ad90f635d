// ==========================================
// 预测情景模拟 - 锁定事件仓
// ==========================================
// 职责: 按类别保存至多 3 个锁定事件的纯状态机
// 形式: reducer (state, action) -> state', 无 I/O
// 红线: 类别内每月至多一个事件; 类别内至多 3 个事件
// 红线: 错误以返回值交给调用方, 不跨越仓边界 panic
// ==========================================

use crate::domain::event::{LockedEvent, LockedEventSet};
use crate::domain::scenario::ToggleSettings;
use crate::domain::types::{EventCategory, Month};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

// ==========================================
// 错误类型
// ==========================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LockError {
    #[error("锁定数量已达上限: category={category}, limit={limit}")]
    CapacityExceeded {
        category: EventCategory,
        limit: usize,
    },

    #[error("该月已存在锁定事件: category={category}, month={month}")]
    DuplicateMonth {
        category: EventCategory,
        month: Month,
    },
}

// ==========================================
// 动作
// ==========================================

/// 清除范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearScope {
    Category(EventCategory),
    All,
}

/// 锁定事件动作（封闭集合, 穷尽匹配）
#[derive(Debug, Clone, PartialEq)]
pub enum LockedEventAction {
    Lock {
        category: EventCategory,
        event: LockedEvent,
    },
    Unlock {
        category: EventCategory,
        month: Month,
    },
    ClearCategory(EventCategory),
    ClearAll,
}

impl LockedEventAction {
    pub fn name(&self) -> &'static str {
        match self {
            LockedEventAction::Lock { .. } => "Lock",
            LockedEventAction::Unlock { .. } => "Unlock",
            LockedEventAction::ClearCategory(_) => "ClearCategory",
            LockedEventAction::ClearAll => "ClearAll",
        }
    }
}

impl From<ClearScope> for LockedEventAction {
    fn from(scope: ClearScope) -> Self {
        match scope {
            ClearScope::Category(category) => LockedEventAction::ClearCategory(category),
            ClearScope::All => LockedEventAction::ClearAll,
        }
    }
}

// ==========================================
// Reducer
// ==========================================

/// 纯 reducer
///
/// # 返回
/// - Ok(Some(state')): 新状态
/// - Ok(None): 无变化（解锁不存在的月份、清除空类别）
/// - Err: 容量或月份冲突, 原状态不变
///
/// 是否变化由动作本身判定, 不比较事件值（乘数可能为 NaN）
pub fn reduce(
    state: &LockedEventSet,
    action: LockedEventAction,
) -> Result<Option<LockedEventSet>, LockError> {
    match action {
        LockedEventAction::Lock { category, event } => {
            let events = state.events(category);
            if events.len() >= EventCategory::MAX_LOCKED {
                return Err(LockError::CapacityExceeded {
                    category,
                    limit: EventCategory::MAX_LOCKED,
                });
            }
            if events.iter().any(|e| e.month == event.month) {
                return Err(LockError::DuplicateMonth {
                    category,
                    month: event.month,
                });
            }
            let mut next = state.clone();
            next.events_mut(category).push(event);
            Ok(Some(next))
        }
        LockedEventAction::Unlock { category, month } => {
            if !state.events(category).iter().any(|e| e.month == month) {
                return Ok(None);
            }
            let mut next = state.clone();
            next.events_mut(category).retain(|e| e.month != month);
            Ok(Some(next))
        }
        LockedEventAction::ClearCategory(category) => {
            if state.events(category).is_empty() {
                return Ok(None);
            }
            let mut next = state.clone();
            next.events_mut(category).clear();
            Ok(Some(next))
        }
        LockedEventAction::ClearAll => {
            if state.is_empty() {
                return Ok(None);
            }
            Ok(Some(LockedEventSet::default()))
        }
    }
}

// ==========================================
// LockedEventStore
// ==========================================
// 持有当前快照与修订号; 修订号只在状态实际变化时递增
#[derive(Debug, Clone, Default)]
pub struct LockedEventStore {
    state: Arc<LockedEventSet>,
    revision: u64,
}

impl LockedEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 分派动作
    ///
    /// # 返回
    /// - Ok(true): 状态发生变化
    /// - Ok(false): 无变化（如解锁不存在的月份）
    pub fn dispatch(&mut self, action: LockedEventAction) -> Result<bool, LockError> {
        let name = action.name();
        let Some(next) = reduce(&self.state, action)? else {
            debug!(action = name, revision = self.revision, "锁定事件无变化");
            return Ok(false);
        };
        self.state = Arc::new(next);
        self.revision += 1;
        debug!(
            action = name,
            revision = self.revision,
            total = self.state.total(),
            "锁定事件已更新"
        );
        Ok(true)
    }

    pub fn lock(&mut self, category: EventCategory, event: LockedEvent) -> Result<bool, LockError> {
        self.dispatch(LockedEventAction::Lock { category, event })
    }

    /// 解锁; 月份不存在时为无操作
    pub fn unlock(&mut self, category: EventCategory, month: Month) -> bool {
        // Unlock 不会失败
        self.dispatch(LockedEventAction::Unlock { category, month })
            .unwrap_or(false)
    }

    pub fn clear(&mut self, scope: ClearScope) -> bool {
        self.dispatch(scope.into()).unwrap_or(false)
    }

    pub fn list(&self, category: EventCategory) -> &[LockedEvent] {
        self.state.events(category)
    }

    pub fn snapshot(&self) -> Arc<LockedEventSet> {
        Arc::clone(&self.state)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ==========================================
    // 展示辅助
    // ==========================================

    pub fn locked_months(&self, category: EventCategory) -> Vec<Month> {
        self.list(category).iter().map(|e| e.month).collect()
    }

    pub fn can_add_more(&self, category: EventCategory) -> bool {
        self.list(category).len() < EventCategory::MAX_LOCKED
    }

    pub fn event_for_month(&self, category: EventCategory, month: Month) -> Option<&LockedEvent> {
        self.list(category).iter().find(|e| e.month == month)
    }

    /// 可供选择的月份
    ///
    /// 过滤规则（展示层规则, 非存储约束）:
    /// - 排除本类别已锁定的月份
    /// - 促销在三月相关开关生效时排除 Mar
    pub fn available_months(&self, category: EventCategory, toggles: &ToggleSettings) -> Vec<Month> {
        let locked = self.locked_months(category);
        Month::ALL
            .iter()
            .copied()
            .filter(|m| !locked.contains(m))
            .filter(|m| {
                !(category == EventCategory::Promotion
                    && *m == Month::Mar
                    && toggles.march_effects_active())
            })
            .collect()
    }
}
