// ==========================================
// 预测情景模拟 - 固定纵轴区间
// ==========================================
// 职责: 仅由基线/交付/实际三条序列计算展示区间, 按选择键缓存
// 红线: 模拟序列永不参与计算
// 红线: 只有选择键变化才重新计算, 参数与结果变化不影响区间
// ==========================================

use crate::domain::selection::SelectionKey;
use crate::domain::series::numeric;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedDomain {
    pub min: f64,
    pub max: f64,
}

impl FixedDomain {
    pub const DEFAULT: FixedDomain = FixedDomain { min: 0.0, max: 100.0 };

    pub fn as_pair(&self) -> [f64; 2] {
        [self.min, self.max]
    }
}

impl Default for FixedDomain {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// 填充比例（占观测范围）
const PADDING_RATIO: f64 = 0.5;
/// 取整步长
const ROUND_STEP: f64 = 10.0;

/// 计算固定区间
///
/// # 规则
/// - 收集三条序列中的全部有效数值
/// - 上下各扩展 50% 观测范围
/// - 下界向下取整到 10 的倍数并不小于 0, 上界向上取整到 10 的倍数
/// - 没有任何数值时为 [0, 100]
pub fn compute_domain(
    baseline: &[Option<f64>],
    delivered: &[Option<f64>],
    actuals: &[Option<f64>],
) -> FixedDomain {
    let mut values = baseline
        .iter()
        .chain(delivered)
        .chain(actuals)
        .filter_map(|v| numeric(*v));

    let Some(first) = values.next() else {
        return FixedDomain::DEFAULT;
    };
    let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let padding = (max - min) * PADDING_RATIO;
    FixedDomain {
        min: (((min - padding) / ROUND_STEP).floor() * ROUND_STEP).max(0.0),
        max: ((max + padding) / ROUND_STEP).ceil() * ROUND_STEP,
    }
}

// ==========================================
// FixedDomainCache - 按选择键缓存
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct FixedDomainCache {
    current: Option<(SelectionKey, FixedDomain)>,
    computations: u64,
}

impl FixedDomainCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 键未变时直接返回缓存, 否则调用 compute 并替换缓存
    pub fn get_or_compute<F>(&mut self, key: &SelectionKey, compute: F) -> FixedDomain
    where
        F: FnOnce() -> FixedDomain,
    {
        if let Some((cached_key, domain)) = &self.current {
            if cached_key == key {
                return *domain;
            }
        }
        let domain = compute();
        self.computations += 1;
        debug!(selection = %key, min = domain.min, max = domain.max, "固定区间已计算");
        self.current = Some((key.clone(), domain));
        domain
    }

    pub fn cached(&self, key: &SelectionKey) -> Option<FixedDomain> {
        self.current
            .as_ref()
            .filter(|(cached_key, _)| cached_key == key)
            .map(|(_, domain)| *domain)
    }

    pub fn invalidate(&mut self) {
        self.current = None;
    }

    /// 实际计算次数
    pub fn computations(&self) -> u64 {
        self.computations
    }
}
