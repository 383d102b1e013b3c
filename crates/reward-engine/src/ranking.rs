//! 结果排序

use std::cmp::Ordering;

use crate::models::{CardResult, DisplayMode};

/// 按所选口径估值降序排列
///
/// 稳定排序：估值相同的卡保持配置顺序。结果先切换到所选口径，
/// 不支持该口径的卡保留在结果中并标记，排在最后。
pub fn rank(mut results: Vec<CardResult>, mode: DisplayMode) -> Vec<CardResult> {
    for result in &mut results {
        result.project(mode);
    }
    results.sort_by(|a, b| compare(a, b, mode));
    results
}

fn compare(a: &CardResult, b: &CardResult, mode: DisplayMode) -> Ordering {
    b.is_supported_for(mode)
        .cmp(&a.is_supported_for(mode))
        .then_with(|| b.estimate(mode).total_cmp(&a.estimate(mode)))
}
