//! 用户档案：持久化的最小单元

use serde::{Deserialize, Serialize};

use super::ledger::UsageLedger;
use super::settings::Settings;

/// 汇总统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub total_spend: f64,
    /// 按提交时的展示口径累计的奖励价值
    pub total_value: f64,
    pub transaction_count: u64,
}

/// 用户档案
///
/// 设置、用量账本与统计一起读写，存储实现只需保证 `save` 同步落盘。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub settings: Settings,
    pub ledger: UsageLedger,
    pub stats: Stats,
}

impl Profile {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn with_ledger(mut self, ledger: UsageLedger) -> Self {
        self.ledger = ledger;
        self
    }
}
